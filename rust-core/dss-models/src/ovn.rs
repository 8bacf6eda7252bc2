// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Opaque version numbers.
//!
//! An OVN is both a fencing token (every write must present the current one)
//! and an awareness token (mutations in an area must present the OVNs of
//! every overlapping entity). Derived OVNs are a one-way hash of the entity
//! id and its last update time so they cannot be guessed from public data.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{EntityId, ModelError};

/// Placeholder returned instead of the real OVN to non-owners.
pub const NO_OVN_PHRASE: &str = "Available from USS";

pub const MIN_OVN_LENGTH: usize = 16;
pub const MAX_OVN_LENGTH: usize = 128;

/// An opaque version token. The empty OVN means "no such entity yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ovn(String);

impl Ovn {
    /// Derive the token for `id` last updated at `updated_at`.
    pub fn derive(id: &EntityId, updated_at: DateTime<Utc>) -> Self {
        Self::derive_from(id.as_str(), updated_at)
    }

    /// Derive a token for any keyed record, e.g. a manager's availability.
    pub fn derive_from(key: &str, updated_at: DateTime<Utc>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.update(b"|");
        hasher.update(updated_at.to_rfc3339_opts(SecondsFormat::Nanos, true).as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Build the token a manager asked for: `"{id}_{suffix}"`.
    pub fn from_requested_suffix(id: &EntityId, suffix: &str) -> Result<Self, ModelError> {
        if suffix.is_empty() {
            return Err(ModelError::InvalidOvn("requested OVN suffix is empty".to_string()));
        }
        let valid_chars = suffix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid_chars {
            return Err(ModelError::InvalidOvn(format!(
                "requested OVN suffix `{suffix}` contains invalid characters"
            )));
        }
        let ovn = Self(format!("{id}_{suffix}"));
        ovn.validate_length()?;
        Ok(ovn)
    }

    /// Wrap a client-presented token without validation.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The redaction sentinel handed to non-owners.
    pub fn redacted() -> Self {
        Self(NO_OVN_PHRASE.to_string())
    }

    pub fn is_redacted(&self) -> bool {
        self.0 == NO_OVN_PHRASE
    }

    /// Non-empty tokens compare by exact string equality; the redaction
    /// sentinel never matches anything.
    pub fn matches(&self, other: &Ovn) -> bool {
        !self.is_redacted() && !other.is_redacted() && self.0 == other.0
    }

    pub fn validate_length(&self) -> Result<(), ModelError> {
        let len = self.0.len();
        if !(MIN_OVN_LENGTH..=MAX_OVN_LENGTH).contains(&len) {
            return Err(ModelError::InvalidOvn(format!(
                "length {len} outside {MIN_OVN_LENGTH}..={MAX_OVN_LENGTH}"
            )));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ovn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn id() -> EntityId {
        EntityId::parse("4348c8e5-0b1c-43cf-9114-2e67a4532765").unwrap()
    }

    #[test]
    fn test_derive_is_deterministic() {
        let t = Utc.with_ymd_and_hms(2024, 9, 10, 13, 0, 0).unwrap();
        assert_eq!(Ovn::derive(&id(), t), Ovn::derive(&id(), t));
    }

    #[test]
    fn test_derive_changes_with_time_and_id() {
        let t = Utc.with_ymd_and_hms(2024, 9, 10, 13, 0, 0).unwrap();
        let a = Ovn::derive(&id(), t);
        let b = Ovn::derive(&id(), t + Duration::nanoseconds(1));
        let c = Ovn::derive(&EntityId::new_v4(), t);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert!(a.validate_length().is_ok());
        assert!(!a.as_str().contains(id().as_str()));
    }

    #[test]
    fn test_requested_suffix() {
        let ovn = Ovn::from_requested_suffix(&id(), "v2").unwrap();
        assert_eq!(ovn.as_str(), "4348c8e5-0b1c-43cf-9114-2e67a4532765_v2");
        assert!(Ovn::from_requested_suffix(&id(), "").is_err());
        assert!(Ovn::from_requested_suffix(&id(), "has space").is_err());
        assert!(Ovn::from_requested_suffix(&id(), &"x".repeat(200)).is_err());
    }

    #[test]
    fn test_redacted_never_matches() {
        assert!(!Ovn::redacted().matches(&Ovn::redacted()));
        assert!(Ovn::new("abc").matches(&Ovn::new("abc")));
        assert!(!Ovn::new("abc").matches(&Ovn::new("abd")));
    }

    #[test]
    fn test_empty() {
        assert!(Ovn::empty().is_empty());
        assert!(Ovn::empty().validate_length().is_err());
    }
}
