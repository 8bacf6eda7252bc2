// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Request parameters and responses of the protocol operations.

use chrono::{DateTime, Utc};
use dss_geo::Volume4D;
use dss_models::{
    Constraint, EntityId, Manager, OperationalIntent, OperationalIntentState, Subscription,
};
use serde::{Deserialize, Serialize};

use crate::notify::SubscriberToNotify;

/// Who is asking, and the instant the request is evaluated at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub manager: Manager,
    pub now: DateTime<Utc>,
}

/// Parameters of the implicit subscription created for an operational
/// intent that does not name one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplicitSubscriptionParams {
    pub uss_base_url: String,
    #[serde(default)]
    pub notify_for_constraints: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutOperationalIntentParams {
    pub extents: Vec<Volume4D>,
    /// OVNs of every entity the caller claims to be aware of.
    #[serde(default)]
    pub key: Vec<dss_models::Ovn>,
    pub state: OperationalIntentState,
    pub uss_base_url: String,
    #[serde(default)]
    pub subscription_id: Option<EntityId>,
    #[serde(default)]
    pub new_subscription: Option<ImplicitSubscriptionParams>,
    /// Suffix of a manager-chosen OVN, stored as `"{id}_{suffix}"`.
    #[serde(default)]
    pub requested_ovn_suffix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutConstraintParams {
    pub extents: Vec<Volume4D>,
    pub uss_base_url: String,
    #[serde(default)]
    pub requested_ovn_suffix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutSubscriptionParams {
    pub extents: Volume4D,
    pub uss_base_url: String,
    pub notify_for_operational_intents: bool,
    pub notify_for_constraints: bool,
}

/// An entity as seen by its own manager, plus everyone who must be told
/// about the change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeResult<T> {
    pub entity: T,
    pub subscribers: Vec<SubscriberToNotify>,
}

/// A stored subscription plus what currently lives in its area, redacted
/// for the subscriber.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionResult {
    pub subscription: Subscription,
    pub operational_intents: Vec<OperationalIntent>,
    pub constraints: Vec<Constraint>,
}

/// Expired entities found, and whether they were removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvictionReport {
    pub operational_intents: Vec<EntityId>,
    pub subscriptions: Vec<EntityId>,
    /// Implicit subscriptions removed because eviction left them unused.
    pub orphaned_subscriptions: Vec<EntityId>,
    pub deleted: bool,
}
