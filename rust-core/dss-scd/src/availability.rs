// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! USS availability records.

use dss_models::{Manager, Ovn, UssAvailability, UssAvailabilityStatus};
use dss_storage::Repository;
use tracing::info;

use crate::checks::next_update_time;
use crate::params::RequestContext;
use crate::ScdError;

pub(crate) fn get(
    repo: &dyn Repository,
    manager: &Manager,
) -> Result<UssAvailabilityStatus, ScdError> {
    Ok(repo
        .get_uss_availability(manager)?
        .unwrap_or_else(|| UssAvailabilityStatus::unknown(manager.clone())))
}

/// Set `manager`'s availability, fenced on the version the caller last saw.
///
/// A manager with no record has an empty version.
pub(crate) fn set(
    repo: &mut dyn Repository,
    ctx: &RequestContext,
    manager: &Manager,
    availability: UssAvailability,
    old_version: &Ovn,
) -> Result<UssAvailabilityStatus, ScdError> {
    let current = repo.get_uss_availability(manager)?;
    let current_version = current
        .as_ref()
        .map(|status| status.version.clone())
        .unwrap_or_else(Ovn::empty);
    if current_version.as_str() != old_version.as_str() {
        return Err(ScdError::VersionMismatch(format!(
            "availability of {manager}: presented version is not the current one"
        )));
    }

    // Records keep no timestamp, so two sets at one instant would repeat a
    // version.
    let mut version = Ovn::derive_from(manager.as_str(), ctx.now);
    if version.as_str() == current_version.as_str() {
        version = Ovn::derive_from(manager.as_str(), next_update_time(ctx.now, Some(ctx.now)));
    }
    let stored = repo.upsert_uss_availability(UssAvailabilityStatus {
        manager: manager.clone(),
        availability,
        version,
    })?;
    info!(manager = %manager, %availability, by = %ctx.manager, "set USS availability");
    Ok(stored)
}
