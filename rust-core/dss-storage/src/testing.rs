// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Row builders shared by the adapter tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use dss_geo::{CoveringConfig, Geometry, IndexedVolume4D, LatLng, Polygon, Volume3D, Volume4D};
use dss_models::{
    EntityId, Manager, OperationalIntent, OperationalIntentState, Ovn, Subscription,
    UssAvailability,
};

pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 10, 12, 0, 0).unwrap()
}

/// A ~1 km square north-east of (`lat`, `lng`), 0-100 m, one hour from t0.
pub(crate) fn volume_at(lat: f64, lng: f64) -> IndexedVolume4D {
    let d = 0.01;
    let square = Geometry::Polygon(Polygon::new(vec![
        LatLng::new(lat, lng),
        LatLng::new(lat + d, lng),
        LatLng::new(lat + d, lng + d),
        LatLng::new(lat, lng + d),
    ]));
    Volume4D::new(
        Volume3D::new(square, Some(0.0), Some(100.0)),
        Some(t0() + Duration::hours(1)),
        Some(t0() + Duration::hours(2)),
    )
    .to_indexed(&CoveringConfig::default())
    .unwrap()
}

pub(crate) fn oi_at(lat: f64, lng: f64) -> OperationalIntent {
    let extent = volume_at(lat, lng);
    let id = EntityId::new_v4();
    OperationalIntent {
        ovn: Ovn::derive(&id, t0()),
        id,
        manager: Manager::new("uss1").unwrap(),
        version: 1,
        state: OperationalIntentState::Accepted,
        past_ovns: Vec::new(),
        start_time: extent.start_time,
        end_time: extent.end_time,
        altitude_lower: extent.altitude_lower,
        altitude_upper: extent.altitude_upper,
        uss_base_url: "https://uss1.example.com".to_string(),
        subscription_id: EntityId::new_v4(),
        cells: extent.cells,
        updated_at: t0(),
        uss_availability: UssAvailability::Unknown,
    }
}

pub(crate) fn subscription_at(lat: f64, lng: f64) -> Subscription {
    let extent = volume_at(lat, lng);
    let id = EntityId::new_v4();
    Subscription {
        ovn: Ovn::derive(&id, t0()),
        id,
        manager: Manager::new("uss1").unwrap(),
        version: 1,
        uss_base_url: "https://uss1.example.com".to_string(),
        notification_index: 0,
        notify_for_operational_intents: true,
        notify_for_constraints: false,
        implicit_subscription: true,
        start_time: extent.start_time,
        end_time: extent.end_time,
        altitude_lower: extent.altitude_lower,
        altitude_upper: extent.altitude_upper,
        cells: extent.cells,
        updated_at: t0(),
    }
}
