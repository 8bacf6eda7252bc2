// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Awareness-key verification.
//!
//! A manager moving an operational intent into a key-requiring state must
//! prove it has seen every overlapping entity by presenting their current
//! OVNs. The check runs inside the mutation's transaction, so nothing can
//! slip into the area between the check and the write.

use std::collections::{BTreeMap, BTreeSet};

use dss_geo::IndexedVolume4D;
use dss_models::{EntityId, Manager, OperationalIntentState, Ovn, UssAvailability};
use dss_storage::Repository;
use tracing::warn;

use crate::checks::availability_of;
use crate::error::AirspaceConflict;
use crate::ScdError;

/// Verify `key` against everything intersecting `area`.
///
/// `own_id` is the entity being written; it never has to be in its own key.
/// Constraints are only checked when `include_constraints` is set (the
/// backing subscription listens for them).
pub(crate) fn verify_key(
    repo: &dyn Repository,
    caller: &Manager,
    own_id: &EntityId,
    area: &IndexedVolume4D,
    key: &[Ovn],
    include_constraints: bool,
) -> Result<(), ScdError> {
    let presented: BTreeSet<&str> = key
        .iter()
        .filter(|ovn| !ovn.is_empty() && !ovn.is_redacted())
        .map(Ovn::as_str)
        .collect();
    let mut availability: BTreeMap<Manager, UssAvailability> = BTreeMap::new();
    let mut conflict = AirspaceConflict::default();

    for oi in repo.search_operational_intents(area)? {
        if &oi.id == own_id || presented.contains(oi.ovn.as_str()) {
            continue;
        }
        if oi.state == OperationalIntentState::Accepted {
            let status = match availability.get(&oi.manager) {
                Some(status) => *status,
                None => {
                    let status = availability_of(repo, &oi.manager)?;
                    availability.insert(oi.manager.clone(), status);
                    status
                }
            };
            if status == UssAvailability::Down {
                continue;
            }
        }
        conflict
            .missing_operational_intents
            .push(oi.redacted_for(caller));
    }

    if include_constraints {
        for constraint in repo.search_constraints(area)? {
            if !presented.contains(constraint.ovn.as_str()) {
                conflict
                    .missing_constraints
                    .push(constraint.redacted_for(caller));
            }
        }
    }

    if conflict.is_empty() {
        return Ok(());
    }
    warn!(
        manager = %caller,
        id = %own_id,
        missing_operational_intents = conflict.missing_operational_intents.len(),
        missing_constraints = conflict.missing_constraints.len(),
        "rejected incomplete awareness key"
    );
    Err(ScdError::MissingOvns(Box::new(conflict)))
}
