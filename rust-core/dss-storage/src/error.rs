// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Storage error types for the DSS repository.
//
// Covers the failure modes of a transactional backing store: I/O, row
// (de)serialization, corrupted rows, an unavailable backend, and
// serialization conflicts between concurrent transactions. Only the last is
// retryable.

use thiserror::Error;

/// Errors that can occur when interacting with a backing store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred in the underlying storage layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or deserialize a stored row.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// A stored row or index entry is inconsistent.
    #[error("corrupted data: {0}")]
    CorruptedData(String),

    /// The backend cannot be reached or refused to start a transaction.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The transaction lost a serialization race and may be re-run.
    #[error("transaction conflict: {0}")]
    Conflict(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Errors that know whether re-running the whole transaction may succeed.
///
/// [`crate::Store::transact`] re-runs a closure whose error reports
/// `true` here, up to the configured retry budget.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for StorageError {
    fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Conflict(_))
    }
}
