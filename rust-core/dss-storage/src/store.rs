// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transaction runner.
//
// A `Store` opens one serializable transaction per attempt, hands the body a
// `&mut dyn Repository`, commits when the body returns `Ok` and aborts on
// `Err`. Retryable failures (serialization conflicts) re-run the whole body
// from scratch, so bodies must not keep side effects outside the
// repository.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Retryable, StorageError};
use crate::repository::Repository;

/// Default number of re-runs after a retryable failure.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// How many times a body is re-run after a retryable failure before the
    /// error is returned to the caller.
    pub max_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// A transactional backing store.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Run `body` inside a transaction, retrying on conflict.
    async fn transact<T, E, F>(&self, body: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StorageError> + Retryable + Send + 'static,
        F: FnMut(&mut dyn Repository) -> Result<T, E> + Send + 'static;

    /// A human-readable name for this store, used in logging and metrics.
    fn name(&self) -> &str;
}

/// Call `attempt` until it succeeds, fails with a non-retryable error, or
/// the retry budget is spent.
pub(crate) fn run_with_retry<T, E, A>(store: &str, max_retries: u32, mut attempt: A) -> Result<T, E>
where
    E: Retryable,
    A: FnMut() -> Result<T, E>,
{
    let mut retries = 0;
    loop {
        match attempt() {
            Ok(value) => {
                debug!(store, retries, "transaction committed");
                return Ok(value);
            }
            Err(err) if err.is_retryable() && retries < max_retries => {
                retries += 1;
                debug!(store, retries, "retrying transaction after conflict");
            }
            Err(err) => {
                if err.is_retryable() {
                    warn!(store, retries, "transaction retry budget exhausted");
                }
                return Err(err);
            }
        }
    }
}

/// Map a failed blocking task into the caller's error type.
pub(crate) fn join_error<E: From<StorageError>>(err: tokio::task::JoinError) -> E {
    StorageError::BackendUnavailable(format!("task join: {err}")).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_until_success() {
        let mut calls = 0;
        let result: Result<u32, StorageError> = run_with_retry("test", 3, || {
            calls += 1;
            if calls < 3 {
                Err(StorageError::Conflict("busy".to_string()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_gives_up_after_budget() {
        let mut calls = 0;
        let result: Result<(), StorageError> = run_with_retry("test", 2, || {
            calls += 1;
            Err(StorageError::Conflict("busy".to_string()))
        });
        assert!(matches!(result, Err(StorageError::Conflict(_))));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_non_retryable_fails_fast() {
        let mut calls = 0;
        let result: Result<(), StorageError> = run_with_retry("test", 5, || {
            calls += 1;
            Err(StorageError::CorruptedData("bad row".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_default_config() {
        assert_eq!(StoreConfig::default().max_retries, 5);
    }
}
