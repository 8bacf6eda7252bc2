// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metrics-collecting wrapper for DSS stores.
//
// Wraps any `Store` and transparently counts transactions, commits, aborts
// and conflict retries, plus the cumulative wall-clock time spent inside
// `transact`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Retryable, StorageError};
use crate::repository::Repository;
use crate::store::Store;

/// Accumulated statistics for a store.
///
/// All counters are monotonically increasing for the lifetime of the
/// [`MetricsStore`] that owns them, until [`MetricsStore::reset_stats`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    /// Number of `transact` calls.
    pub transactions: u64,
    /// Transactions whose body eventually committed.
    pub commits: u64,
    /// Transactions that returned an error.
    pub aborts: u64,
    /// Body re-runs caused by retryable failures.
    pub retries: u64,
    /// Cumulative wall-clock latency of all `transact` calls, in milliseconds.
    pub latency_sum_ms: f64,
}

/// A store wrapper that collects transaction metrics.
///
/// # Example
///
/// ```rust
/// use dss_storage::{MemoryStore, MetricsStore, Repository, StorageError, Store};
///
/// # tokio_test::block_on(async {
/// let metered = MetricsStore::new(MemoryStore::new());
///
/// metered
///     .transact(|_repo: &mut dyn Repository| Ok::<_, StorageError>(()))
///     .await
///     .unwrap();
///
/// let stats = metered.stats().await;
/// assert_eq!(stats.transactions, 1);
/// assert_eq!(stats.commits, 1);
/// # });
/// ```
pub struct MetricsStore<S: Store> {
    /// The wrapped store that runs the actual transactions.
    inner: S,
    /// Shared, mutable statistics accumulator.
    stats: Arc<RwLock<StoreStats>>,
}

impl<S: Store> MetricsStore<S> {
    /// Wrap `inner` with metrics collection.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            stats: Arc::new(RwLock::new(StoreStats::default())),
        }
    }

    /// Return a snapshot of the current statistics.
    pub async fn stats(&self) -> StoreStats {
        self.stats.read().await.clone()
    }

    /// Reset all statistics to zero.
    pub async fn reset_stats(&self) {
        let mut s = self.stats.write().await;
        *s = StoreStats::default();
    }

    /// Return a reference to the inner store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: Store> Store for MetricsStore<S> {
    async fn transact<T, E, F>(&self, mut body: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StorageError> + Retryable + Send + 'static,
        F: FnMut(&mut dyn Repository) -> Result<T, E> + Send + 'static,
    {
        let attempts = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&attempts);
        let counted = move |repo: &mut dyn Repository| {
            counter.fetch_add(1, Ordering::Relaxed);
            body(repo)
        };

        let start = Instant::now();
        let result = self.inner.transact(counted).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut s = self.stats.write().await;
        s.transactions += 1;
        s.retries += attempts.load(Ordering::Relaxed).saturating_sub(1);
        s.latency_sum_ms += elapsed_ms;
        if result.is_ok() {
            s.commits += 1;
        } else {
            s.aborts += 1;
        }

        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
