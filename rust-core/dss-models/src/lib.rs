// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! DSS Models
//!
//! Typed records for the strategic coordination entities and the opaque
//! version tokens (OVNs) that fence writes to them.
//!
//! - [`OperationalIntent`]: a USS's declared use of airspace, with its
//!   [`OperationalIntentState`] machine.
//! - [`Constraint`]: a declared airspace restriction.
//! - [`Subscription`]: a standing interest in changes within an area.
//! - [`UssAvailabilityStatus`]: per-manager availability record.
//!
//! Records carry their resolved extent (time band, altitude band, cells) but
//! never their original geometry.

pub mod availability;
pub mod constraint;
pub mod error;
pub mod ids;
pub mod operational_intent;
pub mod ovn;
pub mod subscription;
pub mod validation;

use chrono::{DateTime, Utc};
use dss_geo::IndexedVolume4D;

pub use availability::{UssAvailability, UssAvailabilityStatus};
pub use constraint::Constraint;
pub use error::ModelError;
pub use ids::{EntityId, Manager};
pub use operational_intent::{OperationalIntent, OperationalIntentState};
pub use ovn::{Ovn, NO_OVN_PHRASE};
pub use subscription::Subscription;

/// Common view of every record kept in the spatial index.
pub trait SpatialEntity: Clone + Send + Sync {
    fn id(&self) -> &EntityId;

    fn manager(&self) -> &Manager;

    /// Resolved envelope used for intersection queries.
    fn extent(&self) -> IndexedVolume4D;

    fn end_time(&self) -> Option<DateTime<Utc>>;

    fn updated_at(&self) -> DateTime<Utc>;

    /// End time, or the last update when the record has no end time.
    fn expires_at(&self) -> DateTime<Utc> {
        self.end_time().unwrap_or_else(|| self.updated_at())
    }

    /// Expired entities end (or were last updated) at or before `threshold`.
    fn is_expired(&self, threshold: DateTime<Utc>) -> bool {
        self.expires_at() <= threshold
    }
}
