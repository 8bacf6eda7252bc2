// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Operational intent mutations and reads.
//!
//! A PUT runs these steps in one transaction:
//!
//! 1. validate the request and resolve its extents;
//! 2. fence on the stored OVN;
//! 3. resolve (or create, reuse, grow) the backing subscription;
//! 4. verify the awareness key for key-requiring states;
//! 5. write the new version;
//! 6. drop any implicit subscription the update left unused;
//! 7. bump every subscription over the old and new extents.

use dss_geo::{IndexedVolume4D, Volume4D};
use dss_models::validation::validate_base_url;
use dss_models::{EntityId, OperationalIntent, Ovn, SpatialEntity, Subscription};
use dss_storage::Repository;
use tracing::{debug, info};

use crate::checks::{
    availability_of, check_delete, check_version, next_update_time, resolve_extents,
};
use crate::error::EntityKind;
use crate::key::verify_key;
use crate::notify::{notify_subscribers, NotifyFor};
use crate::params::{ChangeResult, PutOperationalIntentParams, RequestContext};
use crate::{ScdConfig, ScdError};

const KIND: EntityKind = EntityKind::OperationalIntent;

pub(crate) fn put(
    repo: &mut dyn Repository,
    config: &ScdConfig,
    ctx: &RequestContext,
    id: &EntityId,
    ovn: &Ovn,
    params: &PutOperationalIntentParams,
) -> Result<ChangeResult<OperationalIntent>, ScdError> {
    validate_base_url(&params.uss_base_url, config.allow_http_base_urls)?;
    if let Some(new_subscription) = &params.new_subscription {
        validate_base_url(&new_subscription.uss_base_url, config.allow_http_base_urls)?;
    }
    let extent = resolve_extents(&params.extents, &config.covering(), ctx.now)?;

    let old = repo.get_operational_intent(id)?;
    check_version(
        KIND,
        id,
        &ctx.manager,
        ovn,
        old.as_ref().map(|oi| (&oi.manager, &oi.ovn)),
    )?;
    OperationalIntent::check_transition(old.as_ref().map(|oi| oi.state), params.state)?;

    let subscription = resolve_subscription(repo, ctx, old.as_ref(), &extent, params)?;

    if params.state.requires_key() {
        verify_key(
            repo,
            &ctx.manager,
            id,
            &extent,
            &params.key,
            subscription.notify_for_constraints,
        )?;
    }

    let updated_at = next_update_time(ctx.now, old.as_ref().map(|oi| oi.updated_at));
    let new_ovn = match &params.requested_ovn_suffix {
        Some(suffix) => Ovn::from_requested_suffix(id, suffix)?,
        None => Ovn::derive(id, updated_at),
    };
    let (version, past_ovns) = match &old {
        Some(old) => {
            let mut past = old.past_ovns.clone();
            past.push(old.ovn.clone());
            (old.version + 1, past)
        }
        None => (1, Vec::new()),
    };

    let mut stored = repo.upsert_operational_intent(OperationalIntent {
        id: id.clone(),
        manager: ctx.manager.clone(),
        version,
        state: params.state,
        ovn: new_ovn,
        past_ovns,
        start_time: extent.start_time,
        end_time: extent.end_time,
        altitude_lower: extent.altitude_lower,
        altitude_upper: extent.altitude_upper,
        uss_base_url: params.uss_base_url.clone(),
        subscription_id: subscription.id.clone(),
        cells: extent.cells.clone(),
        updated_at,
        uss_availability: Default::default(),
    })?;
    stored.uss_availability = availability_of(repo, &ctx.manager)?;

    if let Some(old) = &old {
        if old.subscription_id != subscription.id {
            remove_if_orphaned(repo, &old.subscription_id)?;
        }
    }

    let notify_area = match &old {
        Some(old) => old.extent().union(&extent),
        None => extent,
    };
    let subscribers = notify_subscribers(repo, &notify_area, NotifyFor::OperationalIntents)?;

    if old.is_none() {
        info!(id = %id, manager = %ctx.manager, version, "created operational intent");
    } else {
        debug!(id = %id, manager = %ctx.manager, version, "updated operational intent");
    }
    Ok(ChangeResult {
        entity: stored,
        subscribers,
    })
}

/// Find the subscription that will back the intent after this write and
/// make sure it covers `extent`.
fn resolve_subscription(
    repo: &mut dyn Repository,
    ctx: &RequestContext,
    old: Option<&OperationalIntent>,
    extent: &IndexedVolume4D,
    params: &PutOperationalIntentParams,
) -> Result<Subscription, ScdError> {
    if let Some(sub_id) = &params.subscription_id {
        let mut sub = repo
            .get_subscription(sub_id)?
            .ok_or_else(|| ScdError::not_found(EntityKind::Subscription, sub_id))?;
        if sub.manager != ctx.manager {
            return Err(ScdError::PermissionDenied(format!(
                "subscription {sub_id} is owned by another manager"
            )));
        }
        if sub.covers(extent) {
            return Ok(sub);
        }
        if !sub.implicit_subscription {
            return Err(ScdError::BadRequest(format!(
                "explicit subscription {sub_id} does not cover the operational intent"
            )));
        }
        let grown = sub.extent().union(extent);
        sub.set_extent(&grown);
        return bump_subscription(repo, ctx, sub);
    }

    // Reuse the current implicit subscription when this intent is its only
    // dependent, resizing it to the new extent.
    if let Some(old) = old {
        if let Some(mut sub) = repo.get_subscription(&old.subscription_id)? {
            let dependents = repo.get_dependent_operational_intents(&sub.id)?;
            if sub.implicit_subscription && dependents.len() == 1 && dependents[0] == old.id {
                sub.set_extent(extent);
                if let Some(new_params) = &params.new_subscription {
                    sub.uss_base_url = new_params.uss_base_url.clone();
                    sub.notify_for_constraints = new_params.notify_for_constraints;
                }
                return bump_subscription(repo, ctx, sub);
            }
        }
    }

    // Without explicit settings the implicit subscription reports to the
    // intent's own base URL and ignores constraints.
    let (uss_base_url, notify_for_constraints) = match &params.new_subscription {
        Some(new_params) => (new_params.uss_base_url.clone(), new_params.notify_for_constraints),
        None => (params.uss_base_url.clone(), false),
    };
    let id = EntityId::new_v4();
    let created = repo.upsert_subscription(Subscription {
        ovn: Ovn::derive(&id, ctx.now),
        id,
        manager: ctx.manager.clone(),
        version: 1,
        uss_base_url,
        notification_index: 0,
        notify_for_operational_intents: true,
        notify_for_constraints,
        implicit_subscription: true,
        start_time: extent.start_time,
        end_time: extent.end_time,
        altitude_lower: extent.altitude_lower,
        altitude_upper: extent.altitude_upper,
        cells: extent.cells.clone(),
        updated_at: ctx.now,
    })?;
    info!(subscription = %created.id, manager = %ctx.manager, "created implicit subscription");
    Ok(created)
}

fn bump_subscription(
    repo: &mut dyn Repository,
    ctx: &RequestContext,
    mut sub: Subscription,
) -> Result<Subscription, ScdError> {
    sub.version += 1;
    sub.updated_at = next_update_time(ctx.now, Some(sub.updated_at));
    sub.ovn = Ovn::derive(&sub.id, sub.updated_at);
    Ok(repo.upsert_subscription(sub)?)
}

/// Delete `subscription_id` if it is implicit and nothing depends on it.
pub(crate) fn remove_if_orphaned(
    repo: &mut dyn Repository,
    subscription_id: &EntityId,
) -> Result<bool, ScdError> {
    let Some(sub) = repo.get_subscription(subscription_id)? else {
        return Ok(false);
    };
    if !sub.implicit_subscription {
        return Ok(false);
    }
    if !repo.get_dependent_operational_intents(subscription_id)?.is_empty() {
        return Ok(false);
    }
    repo.delete_subscription(subscription_id)?;
    info!(subscription = %subscription_id, "removed unused implicit subscription");
    Ok(true)
}

pub(crate) fn delete(
    repo: &mut dyn Repository,
    ctx: &RequestContext,
    id: &EntityId,
    ovn: Option<&Ovn>,
) -> Result<ChangeResult<OperationalIntent>, ScdError> {
    let mut old = repo
        .get_operational_intent(id)?
        .ok_or_else(|| ScdError::not_found(KIND, id))?;
    check_delete(KIND, id, &ctx.manager, ovn, &old.manager, &old.ovn)?;

    repo.delete_operational_intent(id)?;
    remove_if_orphaned(repo, &old.subscription_id)?;
    let subscribers = notify_subscribers(repo, &old.extent(), NotifyFor::OperationalIntents)?;

    old.uss_availability = availability_of(repo, &old.manager)?;
    info!(id = %id, manager = %ctx.manager, "deleted operational intent");
    Ok(ChangeResult {
        entity: old,
        subscribers,
    })
}

pub(crate) fn get(
    repo: &dyn Repository,
    ctx: &RequestContext,
    id: &EntityId,
) -> Result<OperationalIntent, ScdError> {
    let oi = repo
        .get_operational_intent(id)?
        .ok_or_else(|| ScdError::not_found(KIND, id))?;
    let mut out = oi.redacted_for(&ctx.manager);
    out.uss_availability = availability_of(repo, &oi.manager)?;
    Ok(out)
}

/// Everything intersecting `area`; a missing start time means "from now".
pub(crate) fn query(
    repo: &dyn Repository,
    config: &ScdConfig,
    ctx: &RequestContext,
    area: &Volume4D,
) -> Result<Vec<OperationalIntent>, ScdError> {
    let mut area = area.clone();
    if area.start_time.is_none() {
        area.start_time = Some(ctx.now);
    }
    let area = area.to_indexed(&config.covering())?;

    let mut found = Vec::new();
    for oi in repo.search_operational_intents(&area)? {
        let mut out = oi.redacted_for(&ctx.manager);
        out.uss_availability = availability_of(repo, &oi.manager)?;
        found.push(out);
    }
    Ok(found)
}
