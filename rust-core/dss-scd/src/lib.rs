// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Strategic conflict detection.
//!
//! Managers (USSs) declare operational intents and constraints over 4D
//! volumes and watch areas through subscriptions. Every mutation runs as one
//! store transaction that:
//!
//! - fences on the entity's current OVN (optimistic concurrency);
//! - for key-requiring states, proves the caller knows the current OVN of
//!   every overlapping entity, failing with the full set it is missing;
//! - bumps the notification index of each affected subscription and
//!   returns the subscribers grouped by base URL.
//!
//! Reads redact other managers' OVNs. Delivery of notifications, the HTTP
//! surface and authentication live outside this crate.
//!
//! ```rust
//! use dss_scd::{ScdConfig, ScdService};
//! use dss_storage::MemoryStore;
//!
//! let service = ScdService::new(MemoryStore::new(), ScdConfig::default());
//! assert_eq!(service.config().max_subscriptions_per_area, 10);
//! ```

mod availability;
mod checks;
pub mod clock;
pub mod config;
mod constraint;
pub mod error;
mod evict;
mod key;
pub mod notify;
mod operational_intent;
pub mod params;
mod service;
mod subscription;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ScdConfig, DEFAULT_EVICTION_TTL};
pub use error::{AirspaceConflict, EntityKind, ErrorKind, ScdError};
pub use notify::{NotifyFor, SubscriberToNotify, SubscriptionState};
pub use params::{
    ChangeResult, EvictionReport, ImplicitSubscriptionParams, PutConstraintParams,
    PutOperationalIntentParams, PutSubscriptionParams, RequestContext, SubscriptionResult,
};
pub use service::ScdService;
