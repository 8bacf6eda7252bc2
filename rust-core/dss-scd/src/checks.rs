// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Request checks shared by every mutation.

use chrono::{DateTime, Duration, Utc};
use dss_geo::{union_volumes_4d, CoveringConfig, IndexedVolume4D, Volume4D};
use dss_models::validation::validate_time_range;
use dss_models::{EntityId, Manager, Ovn, UssAvailability};
use dss_storage::Repository;

use crate::error::EntityKind;
use crate::ScdError;

/// Union the requested extents into the envelope that gets stored.
///
/// The envelope needs both time bounds, must end no earlier than it starts
/// and no earlier than `now`, and must cover at least one cell.
pub(crate) fn resolve_extents(
    extents: &[Volume4D],
    covering: &CoveringConfig,
    now: DateTime<Utc>,
) -> Result<IndexedVolume4D, ScdError> {
    if extents.is_empty() {
        return Err(ScdError::BadRequest("missing extents".to_string()));
    }
    let union = union_volumes_4d(extents, covering)?;
    validate_time_range(union.start_time, union.end_time, now)?;
    if union.cells.is_empty() {
        return Err(ScdError::BadRequest("extents cover no area".to_string()));
    }
    Ok(union)
}

/// Timestamp for a write: `now`, nudged past `previous` so a new version
/// never reuses the update time, and therefore the OVN, of the last one.
pub(crate) fn next_update_time(
    now: DateTime<Utc>,
    previous: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    match previous {
        Some(previous) if now <= previous => previous + Duration::microseconds(1),
        _ => now,
    }
}

/// Current-version check for an update or create.
///
/// `existing` is the stored owner and OVN, if the entity exists. An empty
/// presented OVN asks for creation.
pub(crate) fn check_version(
    kind: EntityKind,
    id: &EntityId,
    caller: &Manager,
    presented: &Ovn,
    existing: Option<(&Manager, &Ovn)>,
) -> Result<(), ScdError> {
    match existing {
        None if presented.is_empty() => Ok(()),
        None => Err(ScdError::not_found(kind, id)),
        Some(_) if presented.is_empty() => Err(ScdError::already_exists(kind, id)),
        Some((owner, _)) if owner != caller => Err(ScdError::PermissionDenied(format!(
            "{kind} {id} is owned by another manager"
        ))),
        Some((_, current)) if !current.matches(presented) => Err(ScdError::VersionMismatch(
            format!("{kind} {id}: presented OVN is not the current one"),
        )),
        Some(_) => Ok(()),
    }
}

/// Ownership and optional-OVN check for a delete.
pub(crate) fn check_delete(
    kind: EntityKind,
    id: &EntityId,
    caller: &Manager,
    presented: Option<&Ovn>,
    owner: &Manager,
    current: &Ovn,
) -> Result<(), ScdError> {
    if owner != caller {
        return Err(ScdError::PermissionDenied(format!(
            "{kind} {id} is owned by another manager"
        )));
    }
    match presented {
        Some(ovn) if !current.matches(ovn) => Err(ScdError::VersionMismatch(format!(
            "{kind} {id}: presented OVN is not the current one"
        ))),
        _ => Ok(()),
    }
}

/// Stored availability of `manager`, `Unknown` when none was ever set.
pub(crate) fn availability_of(
    repo: &dyn Repository,
    manager: &Manager,
) -> Result<UssAvailability, ScdError> {
    Ok(repo
        .get_uss_availability(manager)?
        .map(|status| status.availability)
        .unwrap_or_default())
}
