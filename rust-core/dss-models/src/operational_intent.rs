// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Operational intents and their state machine.
//!
//! ```text
//!   Accepted <──> Activated <──> Nonconforming
//!                     ^               ^
//!                     └──> Contingent <┘
//! ```
//!
//! Every state can be re-asserted; entities leave the machine only by
//! deletion.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use dss_geo::{CellSet, IndexedVolume4D};
use serde::{Deserialize, Serialize};

use crate::{EntityId, Manager, ModelError, Ovn, SpatialEntity, UssAvailability};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationalIntentState {
    Accepted,
    Activated,
    Nonconforming,
    Contingent,
}

impl OperationalIntentState {
    /// Whether a mutation into this state must present a complete awareness
    /// key. Off-nominal states bypass the check.
    pub fn requires_key(self) -> bool {
        matches!(self, Self::Accepted | Self::Activated)
    }

    /// Whether entering this state needs the conformance-monitoring
    /// capability. Checked by the authorization layer, not here.
    pub fn requires_cmsa(self) -> bool {
        matches!(self, Self::Nonconforming | Self::Contingent)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use OperationalIntentState::*;
        self == next
            || matches!(
                (self, next),
                (Accepted, Activated)
                    | (Activated, Accepted)
                    | (Activated, Nonconforming)
                    | (Activated, Contingent)
                    | (Nonconforming, Activated)
                    | (Contingent, Activated)
                    | (Nonconforming, Contingent)
                    | (Contingent, Nonconforming)
            )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Activated => "Activated",
            Self::Nonconforming => "Nonconforming",
            Self::Contingent => "Contingent",
        }
    }
}

impl fmt::Display for OperationalIntentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationalIntentState {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Accepted" => Ok(Self::Accepted),
            "Activated" => Ok(Self::Activated),
            "Nonconforming" => Ok(Self::Nonconforming),
            "Contingent" => Ok(Self::Contingent),
            other => Err(ModelError::InvalidState(other.to_string())),
        }
    }
}

/// A stored operational intent reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationalIntent {
    pub id: EntityId,
    pub manager: Manager,
    pub version: u64,
    pub state: OperationalIntentState,
    pub ovn: Ovn,
    /// Tokens this entity carried before, oldest first.
    #[serde(default)]
    pub past_ovns: Vec<Ovn>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub altitude_lower: Option<f64>,
    pub altitude_upper: Option<f64>,
    pub uss_base_url: String,
    pub subscription_id: EntityId,
    pub cells: CellSet,
    pub updated_at: DateTime<Utc>,
    /// Availability of the manager, filled in at read time.
    #[serde(skip_deserializing, default)]
    pub uss_availability: UssAvailability,
}

impl OperationalIntent {
    /// Copy suitable for `viewer`: the real OVN only for the owner.
    pub fn redacted_for(&self, viewer: &Manager) -> Self {
        let mut out = self.clone();
        if &self.manager != viewer {
            out.ovn = Ovn::redacted();
            out.past_ovns.clear();
        }
        out
    }

    /// Validate a requested state change against the current record (or
    /// against creation when `current` is `None`).
    pub fn check_transition(
        current: Option<OperationalIntentState>,
        next: OperationalIntentState,
    ) -> Result<(), ModelError> {
        match current {
            None if next != OperationalIntentState::Accepted => {
                Err(ModelError::InvalidInitialState(next.to_string()))
            }
            None => Ok(()),
            Some(from) if from.can_transition_to(next) => Ok(()),
            Some(from) => Err(ModelError::InvalidStateTransition {
                from: from.to_string(),
                to: next.to_string(),
            }),
        }
    }
}

impl SpatialEntity for OperationalIntent {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn manager(&self) -> &Manager {
        &self.manager
    }

    fn extent(&self) -> IndexedVolume4D {
        IndexedVolume4D {
            start_time: self.start_time,
            end_time: self.end_time,
            altitude_lower: self.altitude_lower,
            altitude_upper: self.altitude_upper,
            cells: self.cells.clone(),
        }
    }

    fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OperationalIntentState::*;

    #[test]
    fn test_requires_key() {
        assert!(Accepted.requires_key());
        assert!(Activated.requires_key());
        assert!(!Nonconforming.requires_key());
        assert!(!Contingent.requires_key());
    }

    #[test]
    fn test_requires_cmsa_is_complement_of_key() {
        for state in [Accepted, Activated, Nonconforming, Contingent] {
            assert_eq!(state.requires_cmsa(), !state.requires_key());
        }
    }

    #[test]
    fn test_transitions() {
        assert!(Accepted.can_transition_to(Activated));
        assert!(Activated.can_transition_to(Accepted));
        assert!(Activated.can_transition_to(Contingent));
        assert!(Nonconforming.can_transition_to(Activated));
        assert!(Contingent.can_transition_to(Nonconforming));
        assert!(Accepted.can_transition_to(Accepted));
        assert!(!Accepted.can_transition_to(Nonconforming));
        assert!(!Accepted.can_transition_to(Contingent));
        assert!(!Nonconforming.can_transition_to(Accepted));
    }

    #[test]
    fn test_initial_state_must_be_accepted() {
        assert!(OperationalIntent::check_transition(None, Accepted).is_ok());
        assert_eq!(
            OperationalIntent::check_transition(None, Activated),
            Err(ModelError::InvalidInitialState("Activated".to_string()))
        );
        assert!(OperationalIntent::check_transition(Some(Accepted), Contingent).is_err());
        assert_eq!(
            OperationalIntent::check_transition(None, Contingent),
            Err(ModelError::InvalidInitialState("Contingent".to_string()))
        );
        assert!(OperationalIntent::check_transition(Some(Activated), Contingent).is_ok());
    }

    #[test]
    fn test_state_parse() {
        assert_eq!("Contingent".parse::<OperationalIntentState>().unwrap(), Contingent);
        assert!("Ended".parse::<OperationalIntentState>().is_err());
    }
}
