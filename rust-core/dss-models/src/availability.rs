// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Per-manager availability.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Manager, ModelError, Ovn};

/// Whether a USS is reachable by its peers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UssAvailability {
    #[default]
    Unknown,
    Normal,
    Down,
}

impl UssAvailability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Normal => "Normal",
            Self::Down => "Down",
        }
    }
}

impl fmt::Display for UssAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UssAvailability {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unknown" => Ok(Self::Unknown),
            "Normal" => Ok(Self::Normal),
            "Down" => Ok(Self::Down),
            other => Err(ModelError::InvalidAvailability(other.to_string())),
        }
    }
}

/// Stored availability of one manager. Managers without a record are
/// [`UssAvailability::Unknown`] with an empty version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UssAvailabilityStatus {
    pub manager: Manager,
    pub availability: UssAvailability,
    pub version: Ovn,
}

impl UssAvailabilityStatus {
    pub fn unknown(manager: Manager) -> Self {
        Self {
            manager,
            availability: UssAvailability::Unknown,
            version: Ovn::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for a in [UssAvailability::Unknown, UssAvailability::Normal, UssAvailability::Down] {
            assert_eq!(a.to_string().parse::<UssAvailability>().unwrap(), a);
        }
        assert!("Purged".parse::<UssAvailability>().is_err());
    }

    #[test]
    fn test_default_unknown() {
        let status = UssAvailabilityStatus::unknown(Manager::new("uss1").unwrap());
        assert_eq!(status.availability, UssAvailability::Unknown);
        assert!(status.version.is_empty());
    }
}
