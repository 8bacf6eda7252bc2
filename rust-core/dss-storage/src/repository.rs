// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Repository port for the strategic coordination entities.
//
// One capability trait per entity kind, combined into `Repository`. A
// repository handle is only ever valid inside a transaction opened by
// `Store::transact`; every call observes and mutates that transaction's
// snapshot. Methods are synchronous because the transaction body runs on a
// blocking worker.

use chrono::{DateTime, Utc};
use dss_geo::IndexedVolume4D;
use dss_models::{
    Constraint, EntityId, Manager, OperationalIntent, Subscription, UssAvailabilityStatus,
};

use crate::error::StorageError;

pub trait OperationalIntentRepo {
    fn get_operational_intent(
        &self,
        id: &EntityId,
    ) -> Result<Option<OperationalIntent>, StorageError>;

    /// Insert or replace the row keyed by `operational_intent.id`, reindexing
    /// its cells. Returns the stored row.
    fn upsert_operational_intent(
        &mut self,
        operational_intent: OperationalIntent,
    ) -> Result<OperationalIntent, StorageError>;

    /// Returns `false` when no such row existed.
    fn delete_operational_intent(&mut self, id: &EntityId) -> Result<bool, StorageError>;

    /// Rows whose cells, time band and altitude band intersect `volume`.
    fn search_operational_intents(
        &self,
        volume: &IndexedVolume4D,
    ) -> Result<Vec<OperationalIntent>, StorageError>;

    /// Ids of operational intents that reference `subscription_id`.
    fn get_dependent_operational_intents(
        &self,
        subscription_id: &EntityId,
    ) -> Result<Vec<EntityId>, StorageError>;

    /// Rows that ended (or, lacking an end, were last updated) at or before
    /// `threshold`.
    fn list_expired_operational_intents(
        &self,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<OperationalIntent>, StorageError>;
}

pub trait ConstraintRepo {
    fn get_constraint(&self, id: &EntityId) -> Result<Option<Constraint>, StorageError>;

    fn upsert_constraint(&mut self, constraint: Constraint) -> Result<Constraint, StorageError>;

    fn delete_constraint(&mut self, id: &EntityId) -> Result<bool, StorageError>;

    fn search_constraints(
        &self,
        volume: &IndexedVolume4D,
    ) -> Result<Vec<Constraint>, StorageError>;
}

pub trait SubscriptionRepo {
    fn get_subscription(&self, id: &EntityId) -> Result<Option<Subscription>, StorageError>;

    fn upsert_subscription(
        &mut self,
        subscription: Subscription,
    ) -> Result<Subscription, StorageError>;

    fn delete_subscription(&mut self, id: &EntityId) -> Result<bool, StorageError>;

    fn search_subscriptions(
        &self,
        volume: &IndexedVolume4D,
    ) -> Result<Vec<Subscription>, StorageError>;

    /// Bump the notification index of every listed subscription by one and
    /// return the new indices in the same order. Unknown ids are an error.
    fn increment_notification_indices(
        &mut self,
        ids: &[EntityId],
    ) -> Result<Vec<u64>, StorageError>;

    fn list_expired_subscriptions(
        &self,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, StorageError>;
}

pub trait AvailabilityRepo {
    fn get_uss_availability(
        &self,
        manager: &Manager,
    ) -> Result<Option<UssAvailabilityStatus>, StorageError>;

    fn upsert_uss_availability(
        &mut self,
        status: UssAvailabilityStatus,
    ) -> Result<UssAvailabilityStatus, StorageError>;
}

/// Every capability the protocol layer needs, as one object-safe handle.
pub trait Repository:
    OperationalIntentRepo + ConstraintRepo + SubscriptionRepo + AvailabilityRepo
{
}

impl<T> Repository for T where
    T: OperationalIntentRepo + ConstraintRepo + SubscriptionRepo + AvailabilityRepo
{
}
