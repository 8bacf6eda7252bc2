// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request builders shared by the protocol integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use dss_geo::{Geometry, LatLng, Polygon, Volume3D, Volume4D};
use dss_models::{Manager, OperationalIntentState, Ovn};
use dss_scd::{
    FixedClock, ImplicitSubscriptionParams, PutConstraintParams, PutOperationalIntentParams,
    PutSubscriptionParams, ScdConfig, ScdService,
};
use dss_storage::{MemoryStore, Store};

pub const SFO_LAT: f64 = 37.40;
pub const SFO_LNG: f64 = -122.10;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 10, 12, 0, 0).unwrap()
}

pub fn manager(name: &str) -> Manager {
    Manager::new(name).unwrap()
}

pub fn base_url(manager: &Manager) -> String {
    format!("https://{manager}.example.com")
}

pub type TestService<S = MemoryStore> = ScdService<S, FixedClock>;

pub fn service() -> (TestService, FixedClock) {
    service_with(MemoryStore::new(), ScdConfig::default())
}

pub fn service_with<S: Store>(store: S, config: ScdConfig) -> (TestService<S>, FixedClock) {
    let clock = FixedClock::new(t0());
    (ScdService::with_clock(store, config, clock.clone()), clock)
}

/// A ~1 km square north-east of (`lat`, `lng`), 0-100 m, from `start_h` to
/// `end_h` hours after t0.
pub fn square(lat: f64, lng: f64, start_h: i64, end_h: i64) -> Volume4D {
    let d = 0.01;
    let footprint = Geometry::Polygon(Polygon::new(vec![
        LatLng::new(lat, lng),
        LatLng::new(lat + d, lng),
        LatLng::new(lat + d, lng + d),
        LatLng::new(lat, lng + d),
    ]));
    Volume4D::new(
        Volume3D::new(footprint, Some(0.0), Some(100.0)),
        Some(t0() + Duration::hours(start_h)),
        Some(t0() + Duration::hours(end_h)),
    )
}

/// The default test square over the bay area, one hour from t0.
pub fn here() -> Volume4D {
    square(SFO_LAT, SFO_LNG, 1, 2)
}

/// Somewhere that shares no cell with [`here`].
pub fn elsewhere() -> Volume4D {
    square(48.85, 2.35, 1, 2)
}

pub fn oi_params(
    manager: &Manager,
    extents: Vec<Volume4D>,
    state: OperationalIntentState,
    key: Vec<Ovn>,
) -> PutOperationalIntentParams {
    PutOperationalIntentParams {
        extents,
        key,
        state,
        uss_base_url: base_url(manager),
        subscription_id: None,
        new_subscription: Some(ImplicitSubscriptionParams {
            uss_base_url: base_url(manager),
            notify_for_constraints: false,
        }),
        requested_ovn_suffix: None,
    }
}

pub fn accepted(manager: &Manager, extent: Volume4D) -> PutOperationalIntentParams {
    oi_params(manager, vec![extent], OperationalIntentState::Accepted, Vec::new())
}

pub fn constraint_params(manager: &Manager, extent: Volume4D) -> PutConstraintParams {
    PutConstraintParams {
        extents: vec![extent],
        uss_base_url: base_url(manager),
        requested_ovn_suffix: None,
    }
}

pub fn subscription_params(
    manager: &Manager,
    extent: Volume4D,
    for_operational_intents: bool,
    for_constraints: bool,
) -> PutSubscriptionParams {
    PutSubscriptionParams {
        extents: extent,
        uss_base_url: base_url(manager),
        notify_for_operational_intents: for_operational_intents,
        notify_for_constraints: for_constraints,
    }
}
