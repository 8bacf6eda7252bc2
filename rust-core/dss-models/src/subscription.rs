// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Area subscriptions.
//!
//! A subscription is either explicit (created by a manager to watch an
//! area) or implicit (created on the fly to back an operational intent that
//! did not name one). Implicit subscriptions are removed once nothing
//! depends on them.

use chrono::{DateTime, Utc};
use dss_geo::{CellSet, IndexedVolume4D};
use serde::{Deserialize, Serialize};

use crate::{EntityId, Manager, ModelError, Ovn, SpatialEntity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: EntityId,
    pub manager: Manager,
    pub version: u64,
    pub ovn: Ovn,
    pub uss_base_url: String,
    /// Incremented every time a notification is addressed to this
    /// subscription.
    pub notification_index: u64,
    pub notify_for_operational_intents: bool,
    pub notify_for_constraints: bool,
    pub implicit_subscription: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub altitude_lower: Option<f64>,
    pub altitude_upper: Option<f64>,
    pub cells: CellSet,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.notify_for_operational_intents && !self.notify_for_constraints {
            return Err(ModelError::NoNotificationTarget);
        }
        Ok(())
    }

    /// Replace the stored extent with `extent`.
    pub fn set_extent(&mut self, extent: &IndexedVolume4D) {
        self.start_time = extent.start_time;
        self.end_time = extent.end_time;
        self.altitude_lower = extent.altitude_lower;
        self.altitude_upper = extent.altitude_upper;
        self.cells = extent.cells.clone();
    }

    /// The subscription's envelope contains `extent` in every dimension.
    pub fn covers(&self, extent: &IndexedVolume4D) -> bool {
        self.extent().covers(extent)
    }
}

impl SpatialEntity for Subscription {
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
    use chrono::{Duration, TimeZone};
    use dss_geo::CellId;

    fn sample() -> Subscription {
        let t = Utc.with_ymd_and_hms(2024, 9, 10, 12, 0, 0).unwrap();
        Subscription {
            id: EntityId::new_v4(),
            manager: Manager::new("uss1").unwrap(),
            version: 1,
            ovn: Ovn::new("0123456789abcdef"),
            uss_base_url: "https://uss1.example.com".to_string(),
            notification_index: 0,
            notify_for_operational_intents: true,
            notify_for_constraints: false,
            implicit_subscription: false,
            start_time: Some(t),
            end_time: Some(t + Duration::hours(2)),
            altitude_lower: Some(0.0),
            altitude_upper: Some(100.0),
            cells: [CellId::from_lat_lng(37.0, -122.0, dss_geo::CELL_LEVEL)]
                .into_iter()
                .collect(),
            updated_at: t,
        }
    }

    #[test]
    fn test_requires_notification_target() {
        let mut sub = sample();
        assert!(sub.validate().is_ok());
        sub.notify_for_operational_intents = false;
        assert_eq!(sub.validate(), Err(ModelError::NoNotificationTarget));
    }

    #[test]
    fn test_covers_own_extent_but_not_longer() {
        let sub = sample();
        let mut extent = sub.extent();
        assert!(sub.covers(&extent));
        extent.end_time = extent.end_time.map(|t| t + Duration::minutes(1));
        assert!(!sub.covers(&extent));
    }

    #[test]
    fn test_expiry_uses_end_time() {
        let sub = sample();
        let end = sub.end_time.unwrap();
        assert!(sub.is_expired(end));
        assert!(!sub.is_expired(end - Duration::seconds(1)));
    }
}
