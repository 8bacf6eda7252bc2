// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Explicit subscription lifecycle.
//!
//! Subscriptions are private to their manager: nobody else can read,
//! update, or delete them. A PUT responds with everything currently in the
//! subscribed area so the subscriber starts from a consistent picture.

use std::collections::BTreeMap;

use dss_geo::{CellId, IndexedVolume4D, Volume4D};
use dss_models::validation::{validate_base_url, validate_time_range};
use dss_models::{EntityId, Ovn, SpatialEntity, Subscription};
use dss_storage::Repository;
use tracing::{debug, info};

use crate::checks::{availability_of, check_delete, check_version, next_update_time};
use crate::config::to_chrono;
use crate::error::EntityKind;
use crate::params::{PutSubscriptionParams, RequestContext, SubscriptionResult};
use crate::{ScdConfig, ScdError};

const KIND: EntityKind = EntityKind::Subscription;

pub(crate) fn put(
    repo: &mut dyn Repository,
    config: &ScdConfig,
    ctx: &RequestContext,
    id: &EntityId,
    ovn: &Ovn,
    params: &PutSubscriptionParams,
) -> Result<SubscriptionResult, ScdError> {
    validate_base_url(&params.uss_base_url, config.allow_http_base_urls)?;
    let extent = resolve_window(config, ctx, &params.extents)?;

    let old = repo.get_subscription(id)?;
    check_version(
        KIND,
        id,
        &ctx.manager,
        ovn,
        old.as_ref().map(|sub| (&sub.manager, &sub.ovn)),
    )?;

    if let Some(old) = &old {
        for dependent in repo.get_dependent_operational_intents(&old.id)? {
            let Some(oi) = repo.get_operational_intent(&dependent)? else {
                continue;
            };
            if !extent.covers(&oi.extent()) {
                return Err(ScdError::VersionMismatch(format!(
                    "subscription {id} would no longer cover operational intent {dependent}"
                )));
            }
        }
    }

    let implicit = old.as_ref().is_some_and(|sub| sub.implicit_subscription);
    if !implicit {
        check_area_limit(repo, config, ctx, id, &extent)?;
    }

    let updated_at = next_update_time(ctx.now, old.as_ref().map(|sub| sub.updated_at));
    let (version, notification_index) = match &old {
        Some(old) => (old.version + 1, old.notification_index),
        None => (1, 0),
    };
    let record = Subscription {
        id: id.clone(),
        manager: ctx.manager.clone(),
        version,
        ovn: Ovn::derive(id, updated_at),
        uss_base_url: params.uss_base_url.clone(),
        notification_index,
        notify_for_operational_intents: params.notify_for_operational_intents,
        notify_for_constraints: params.notify_for_constraints,
        implicit_subscription: implicit,
        start_time: extent.start_time,
        end_time: extent.end_time,
        altitude_lower: extent.altitude_lower,
        altitude_upper: extent.altitude_upper,
        cells: extent.cells.clone(),
        updated_at,
    };
    record.validate()?;
    let stored = repo.upsert_subscription(record)?;

    let mut operational_intents = Vec::new();
    if stored.notify_for_operational_intents {
        for oi in repo.search_operational_intents(&extent)? {
            let mut out = oi.redacted_for(&ctx.manager);
            out.uss_availability = availability_of(repo, &oi.manager)?;
            operational_intents.push(out);
        }
    }
    let mut constraints = Vec::new();
    if stored.notify_for_constraints {
        for constraint in repo.search_constraints(&extent)? {
            let mut out = constraint.redacted_for(&ctx.manager);
            out.uss_availability = availability_of(repo, &constraint.manager)?;
            constraints.push(out);
        }
    }

    if old.is_none() {
        info!(id = %id, manager = %ctx.manager, "created subscription");
    } else {
        debug!(id = %id, manager = %ctx.manager, version, "updated subscription");
    }
    Ok(SubscriptionResult {
        subscription: stored,
        operational_intents,
        constraints,
    })
}

/// Fill in the default window and enforce the maximum duration.
fn resolve_window(
    config: &ScdConfig,
    ctx: &RequestContext,
    extents: &Volume4D,
) -> Result<IndexedVolume4D, ScdError> {
    let mut area = extents.clone();
    let start = *area.start_time.get_or_insert(ctx.now);
    if area.end_time.is_none() {
        area.end_time = Some(start + to_chrono(config.default_subscription_duration));
    }
    let (start, end) = validate_time_range(area.start_time, area.end_time, ctx.now)?;
    if end - start > to_chrono(config.max_subscription_duration) {
        return Err(ScdError::BadRequest(format!(
            "subscription window exceeds {}s",
            config.max_subscription_duration.as_secs()
        )));
    }

    let extent = area.to_indexed(&config.covering())?;
    if extent.cells.is_empty() {
        return Err(ScdError::BadRequest("extents cover no area".to_string()));
    }
    Ok(extent)
}

/// Reject the write if any cell of `extent` already carries the maximum
/// number of the caller's other explicit subscriptions over the same time.
fn check_area_limit(
    repo: &dyn Repository,
    config: &ScdConfig,
    ctx: &RequestContext,
    id: &EntityId,
    extent: &IndexedVolume4D,
) -> Result<(), ScdError> {
    let mut per_cell: BTreeMap<CellId, usize> = BTreeMap::new();
    for sub in repo.search_subscriptions(extent)? {
        if &sub.id == id || sub.manager != ctx.manager || sub.implicit_subscription {
            continue;
        }
        for cell in sub.cells.iter().filter(|cell| extent.cells.contains(cell)) {
            *per_cell.entry(*cell).or_default() += 1;
        }
    }
    match per_cell.into_iter().find(|(_, n)| *n >= config.max_subscriptions_per_area) {
        Some((cell, n)) => Err(ScdError::BadRequest(format!(
            "too many subscriptions in area: cell {cell} already has {n}"
        ))),
        None => Ok(()),
    }
}

pub(crate) fn delete(
    repo: &mut dyn Repository,
    ctx: &RequestContext,
    id: &EntityId,
    ovn: Option<&Ovn>,
) -> Result<Subscription, ScdError> {
    let old = repo
        .get_subscription(id)?
        .ok_or_else(|| ScdError::not_found(KIND, id))?;
    check_delete(KIND, id, &ctx.manager, ovn, &old.manager, &old.ovn)?;
    if !repo.get_dependent_operational_intents(id)?.is_empty() {
        return Err(ScdError::BadRequest(format!(
            "subscription {id} still backs operational intents"
        )));
    }

    repo.delete_subscription(id)?;
    info!(id = %id, manager = %ctx.manager, "deleted subscription");
    Ok(old)
}

pub(crate) fn get(
    repo: &dyn Repository,
    ctx: &RequestContext,
    id: &EntityId,
) -> Result<Subscription, ScdError> {
    let sub = repo
        .get_subscription(id)?
        .ok_or_else(|| ScdError::not_found(KIND, id))?;
    if sub.manager != ctx.manager {
        return Err(ScdError::PermissionDenied(format!(
            "subscription {id} is owned by another manager"
        )));
    }
    Ok(sub)
}

/// The caller's own subscriptions intersecting `area`.
pub(crate) fn query(
    repo: &dyn Repository,
    config: &ScdConfig,
    ctx: &RequestContext,
    area: &Volume4D,
) -> Result<Vec<Subscription>, ScdError> {
    let mut area = area.clone();
    if area.start_time.is_none() {
        area.start_time = Some(ctx.now);
    }
    let area = area.to_indexed(&config.covering())?;
    Ok(repo
        .search_subscriptions(&area)?
        .into_iter()
        .filter(|sub| sub.manager == ctx.manager)
        .collect())
}
