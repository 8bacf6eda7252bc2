// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DSS Storage
//
// The transactional repository port used by the strategic coordination
// protocol, and the stores that implement it. Protocol code never sees the
// backing store: it receives a `&mut dyn Repository` scoped to one
// serializable transaction and returns a result; the store commits on `Ok`,
// aborts on `Err`, and transparently re-runs the body on conflict.
//
// # Modules
//
// - [`repository`] -- Per-entity capability traits combined into `Repository`.
// - [`store`] -- The `Store` transaction runner and its retry policy.
// - [`error`] -- `StorageError` and the `Retryable` classification.
// - [`memory`] -- An in-memory store for tests and single-process use.
// - [`metrics`] -- A transparent wrapper that counts commits/aborts/retries.
// - `redb_backend` -- A persistent single-file store (feature `redb-backend`).
//
// # Example
//
// ```rust
// use dss_storage::{MemoryStore, Repository, StorageError, Store};
//
// # tokio_test::block_on(async {
// let store = MemoryStore::new();
// let expired = store
//     .transact(|repo: &mut dyn Repository| {
//         repo.list_expired_operational_intents(chrono::Utc::now())
//     })
//     .await
//     .unwrap();
// assert!(expired.is_empty());
// # });
// ```

pub mod error;
pub mod memory;
pub mod metrics;
pub mod repository;
pub mod store;

// Optional persistent backends, feature-gated to keep the default build lean.
#[cfg(feature = "redb-backend")]
pub mod redb_backend;

#[cfg(test)]
mod testing;

pub use error::{Retryable, StorageError};
pub use memory::MemoryStore;
pub use metrics::{MetricsStore, StoreStats};
pub use repository::{
    AvailabilityRepo, ConstraintRepo, OperationalIntentRepo, Repository, SubscriptionRepo,
};
pub use store::{Store, StoreConfig, DEFAULT_MAX_RETRIES};

#[cfg(feature = "redb-backend")]
pub use redb_backend::RedbStore;
