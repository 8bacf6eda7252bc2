// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory store.
//
// Rows live in `BTreeMap`s keyed by entity id, with a per-kind
// cell -> ids index for intersection search. Transactions hold a mutex for
// their whole duration, so they are trivially serializable; each attempt
// works on a copy of the state that replaces the committed state only on
// success. Intended for tests and single-process deployments.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dss_geo::{CellId, IndexedVolume4D};
use dss_models::{
    Constraint, EntityId, Manager, OperationalIntent, SpatialEntity, Subscription,
    UssAvailabilityStatus,
};

use crate::error::{Retryable, StorageError};
use crate::repository::{
    AvailabilityRepo, ConstraintRepo, OperationalIntentRepo, Repository, SubscriptionRepo,
};
use crate::store::{join_error, run_with_retry, Store, StoreConfig};

/// Rows of one entity kind plus their cell index.
#[derive(Debug, Clone)]
struct Table<T> {
    rows: BTreeMap<EntityId, T>,
    cells: BTreeMap<CellId, BTreeSet<EntityId>>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            cells: BTreeMap::new(),
        }
    }
}

impl<T: SpatialEntity> Table<T> {
    fn get(&self, id: &EntityId) -> Option<T> {
        self.rows.get(id).cloned()
    }

    fn upsert(&mut self, row: T) -> T {
        let id = row.id().clone();
        self.unindex(&id);
        for cell in row.extent().cells.iter() {
            self.cells.entry(*cell).or_default().insert(id.clone());
        }
        self.rows.insert(id, row.clone());
        row
    }

    fn delete(&mut self, id: &EntityId) -> bool {
        self.unindex(id);
        self.rows.remove(id).is_some()
    }

    fn unindex(&mut self, id: &EntityId) {
        let Some(old) = self.rows.get(id) else {
            return;
        };
        for cell in old.extent().cells.iter() {
            if let Some(ids) = self.cells.get_mut(cell) {
                ids.remove(id);
                if ids.is_empty() {
                    self.cells.remove(cell);
                }
            }
        }
    }

    fn search(&self, volume: &IndexedVolume4D) -> Vec<T> {
        let mut candidates = BTreeSet::new();
        for cell in volume.cells.iter() {
            if let Some(ids) = self.cells.get(cell) {
                candidates.extend(ids.iter());
            }
        }
        candidates
            .into_iter()
            .filter_map(|id| self.rows.get(id))
            .filter(|row| row.extent().intersects(volume))
            .cloned()
            .collect()
    }

    fn list_expired(&self, threshold: DateTime<Utc>) -> Vec<T> {
        self.rows
            .values()
            .filter(|row| row.is_expired(threshold))
            .cloned()
            .collect()
    }
}

/// Complete committed state of a [`MemoryStore`].
#[derive(Debug, Clone, Default)]
struct MemoryState {
    operational_intents: Table<OperationalIntent>,
    constraints: Table<Constraint>,
    subscriptions: Table<Subscription>,
    availability: BTreeMap<Manager, UssAvailabilityStatus>,
}

impl OperationalIntentRepo for MemoryState {
    fn get_operational_intent(
        &self,
        id: &EntityId,
    ) -> Result<Option<OperationalIntent>, StorageError> {
        Ok(self.operational_intents.get(id))
    }

    fn upsert_operational_intent(
        &mut self,
        operational_intent: OperationalIntent,
    ) -> Result<OperationalIntent, StorageError> {
        Ok(self.operational_intents.upsert(operational_intent))
    }

    fn delete_operational_intent(&mut self, id: &EntityId) -> Result<bool, StorageError> {
        Ok(self.operational_intents.delete(id))
    }

    fn search_operational_intents(
        &self,
        volume: &IndexedVolume4D,
    ) -> Result<Vec<OperationalIntent>, StorageError> {
        Ok(self.operational_intents.search(volume))
    }

    fn get_dependent_operational_intents(
        &self,
        subscription_id: &EntityId,
    ) -> Result<Vec<EntityId>, StorageError> {
        Ok(self
            .operational_intents
            .rows
            .values()
            .filter(|oi| &oi.subscription_id == subscription_id)
            .map(|oi| oi.id.clone())
            .collect())
    }

    fn list_expired_operational_intents(
        &self,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<OperationalIntent>, StorageError> {
        Ok(self.operational_intents.list_expired(threshold))
    }
}

impl ConstraintRepo for MemoryState {
    fn get_constraint(&self, id: &EntityId) -> Result<Option<Constraint>, StorageError> {
        Ok(self.constraints.get(id))
    }

    fn upsert_constraint(&mut self, constraint: Constraint) -> Result<Constraint, StorageError> {
        Ok(self.constraints.upsert(constraint))
    }

    fn delete_constraint(&mut self, id: &EntityId) -> Result<bool, StorageError> {
        Ok(self.constraints.delete(id))
    }

    fn search_constraints(
        &self,
        volume: &IndexedVolume4D,
    ) -> Result<Vec<Constraint>, StorageError> {
        Ok(self.constraints.search(volume))
    }
}

impl SubscriptionRepo for MemoryState {
    fn get_subscription(&self, id: &EntityId) -> Result<Option<Subscription>, StorageError> {
        Ok(self.subscriptions.get(id))
    }

    fn upsert_subscription(
        &mut self,
        subscription: Subscription,
    ) -> Result<Subscription, StorageError> {
        Ok(self.subscriptions.upsert(subscription))
    }

    fn delete_subscription(&mut self, id: &EntityId) -> Result<bool, StorageError> {
        Ok(self.subscriptions.delete(id))
    }

    fn search_subscriptions(
        &self,
        volume: &IndexedVolume4D,
    ) -> Result<Vec<Subscription>, StorageError> {
        Ok(self.subscriptions.search(volume))
    }

    fn increment_notification_indices(
        &mut self,
        ids: &[EntityId],
    ) -> Result<Vec<u64>, StorageError> {
        let mut indices = Vec::with_capacity(ids.len());
        for id in ids {
            let sub = self.subscriptions.rows.get_mut(id).ok_or_else(|| {
                StorageError::CorruptedData(format!("subscription {id} vanished during notify"))
            })?;
            sub.notification_index += 1;
            indices.push(sub.notification_index);
        }
        Ok(indices)
    }

    fn list_expired_subscriptions(
        &self,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, StorageError> {
        Ok(self.subscriptions.list_expired(threshold))
    }
}

impl AvailabilityRepo for MemoryState {
    fn get_uss_availability(
        &self,
        manager: &Manager,
    ) -> Result<Option<UssAvailabilityStatus>, StorageError> {
        Ok(self.availability.get(manager).cloned())
    }

    fn upsert_uss_availability(
        &mut self,
        status: UssAvailabilityStatus,
    ) -> Result<UssAvailabilityStatus, StorageError> {
        self.availability.insert(status.manager.clone(), status.clone());
        Ok(status)
    }
}

/// An in-memory [`Store`].
///
/// Clones share state. [`MemoryStore::inject_conflicts`] makes the next
/// commits fail with a retryable conflict, for exercising retry paths.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    pending_conflicts: Arc<AtomicU32>,
    config: StoreConfig,
}

impl MemoryStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            pending_conflicts: Arc::new(AtomicU32::new(0)),
            config,
        }
    }

    /// Fail the next `count` commit attempts with [`StorageError::Conflict`].
    pub fn inject_conflicts(&self, count: u32) {
        self.pending_conflicts.store(count, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Consume one pending injected conflict, if any.
fn take_conflict(pending: &AtomicU32) -> bool {
    pending
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl Store for MemoryStore {
    async fn transact<T, E, F>(&self, mut body: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StorageError> + Retryable + Send + 'static,
        F: FnMut(&mut dyn Repository) -> Result<T, E> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let pending = Arc::clone(&self.pending_conflicts);
        let max_retries = self.config.max_retries;

        tokio::task::spawn_blocking(move || {
            run_with_retry("in-memory", max_retries, || {
                let mut committed = state.lock().map_err(|_| {
                    StorageError::BackendUnavailable("in-memory state lock poisoned".to_string())
                })?;
                let mut working = committed.clone();
                let value = body(&mut working)?;
                if take_conflict(&pending) {
                    return Err(StorageError::Conflict("injected conflict".to_string()).into());
                }
                *committed = working;
                Ok(value)
            })
        })
        .await
        .unwrap_or_else(|e| Err(join_error(e)))
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
