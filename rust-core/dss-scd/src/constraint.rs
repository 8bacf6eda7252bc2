// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Constraint mutations and reads.
//!
//! Constraints follow the same fencing rules as operational intents but
//! carry no subscription and are not gated on an awareness key.

use dss_geo::Volume4D;
use dss_models::validation::validate_base_url;
use dss_models::{Constraint, EntityId, Ovn, SpatialEntity};
use dss_storage::Repository;
use tracing::{debug, info};

use crate::checks::{
    availability_of, check_delete, check_version, next_update_time, resolve_extents,
};
use crate::error::EntityKind;
use crate::notify::{notify_subscribers, NotifyFor};
use crate::params::{ChangeResult, PutConstraintParams, RequestContext};
use crate::{ScdConfig, ScdError};

const KIND: EntityKind = EntityKind::Constraint;

pub(crate) fn put(
    repo: &mut dyn Repository,
    config: &ScdConfig,
    ctx: &RequestContext,
    id: &EntityId,
    ovn: &Ovn,
    params: &PutConstraintParams,
) -> Result<ChangeResult<Constraint>, ScdError> {
    validate_base_url(&params.uss_base_url, config.allow_http_base_urls)?;
    let extent = resolve_extents(&params.extents, &config.covering(), ctx.now)?;

    let old = repo.get_constraint(id)?;
    check_version(
        KIND,
        id,
        &ctx.manager,
        ovn,
        old.as_ref().map(|c| (&c.manager, &c.ovn)),
    )?;

    let updated_at = next_update_time(ctx.now, old.as_ref().map(|c| c.updated_at));
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

    let mut stored = repo.upsert_constraint(Constraint {
        id: id.clone(),
        manager: ctx.manager.clone(),
        version,
        ovn: new_ovn,
        past_ovns,
        start_time: extent.start_time,
        end_time: extent.end_time,
        altitude_lower: extent.altitude_lower,
        altitude_upper: extent.altitude_upper,
        uss_base_url: params.uss_base_url.clone(),
        cells: extent.cells.clone(),
        updated_at,
        uss_availability: Default::default(),
    })?;
    stored.uss_availability = availability_of(repo, &ctx.manager)?;

    let notify_area = match &old {
        Some(old) => old.extent().union(&extent),
        None => extent,
    };
    let subscribers = notify_subscribers(repo, &notify_area, NotifyFor::Constraints)?;

    if old.is_none() {
        info!(id = %id, manager = %ctx.manager, version, "created constraint");
    } else {
        debug!(id = %id, manager = %ctx.manager, version, "updated constraint");
    }
    Ok(ChangeResult {
        entity: stored,
        subscribers,
    })
}

pub(crate) fn delete(
    repo: &mut dyn Repository,
    ctx: &RequestContext,
    id: &EntityId,
    ovn: Option<&Ovn>,
) -> Result<ChangeResult<Constraint>, ScdError> {
    let mut old = repo
        .get_constraint(id)?
        .ok_or_else(|| ScdError::not_found(KIND, id))?;
    check_delete(KIND, id, &ctx.manager, ovn, &old.manager, &old.ovn)?;

    repo.delete_constraint(id)?;
    let subscribers = notify_subscribers(repo, &old.extent(), NotifyFor::Constraints)?;

    old.uss_availability = availability_of(repo, &old.manager)?;
    info!(id = %id, manager = %ctx.manager, "deleted constraint");
    Ok(ChangeResult {
        entity: old,
        subscribers,
    })
}

pub(crate) fn get(
    repo: &dyn Repository,
    ctx: &RequestContext,
    id: &EntityId,
) -> Result<Constraint, ScdError> {
    let constraint = repo
        .get_constraint(id)?
        .ok_or_else(|| ScdError::not_found(KIND, id))?;
    let mut out = constraint.redacted_for(&ctx.manager);
    out.uss_availability = availability_of(repo, &constraint.manager)?;
    Ok(out)
}

pub(crate) fn query(
    repo: &dyn Repository,
    config: &ScdConfig,
    ctx: &RequestContext,
    area: &Volume4D,
) -> Result<Vec<Constraint>, ScdError> {
    let mut area = area.clone();
    if area.start_time.is_none() {
        area.start_time = Some(ctx.now);
    }
    let area = area.to_indexed(&config.covering())?;

    let mut found = Vec::new();
    for constraint in repo.search_constraints(&area)? {
        let mut out = constraint.redacted_for(&ctx.manager);
        out.uss_availability = availability_of(repo, &constraint.manager)?;
        found.push(out);
    }
    Ok(found)
}
