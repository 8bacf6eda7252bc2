// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Protocol errors.
//!
//! [`ScdError`] carries enough structure for a transport layer to pick a
//! status code from [`ScdError::kind`] without re-deriving context.

use std::fmt;

use dss_geo::GeometryError;
use dss_models::{Constraint, ModelError, OperationalIntent};
use dss_storage::{Retryable, StorageError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    OperationalIntent,
    Constraint,
    Subscription,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::OperationalIntent => "operational intent",
            EntityKind::Constraint => "constraint",
            EntityKind::Subscription => "subscription",
        })
    }
}

/// Coarse classification of an [`ScdError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    BadRequest,
    PermissionDenied,
    NotFound,
    AlreadyExists,
    VersionMismatch,
    MissingOvns,
    Internal,
}

/// Entities the caller must acknowledge before its mutation can proceed.
///
/// Every entry is already redacted for the requesting manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AirspaceConflict {
    pub missing_operational_intents: Vec<OperationalIntent>,
    pub missing_constraints: Vec<Constraint>,
}

impl AirspaceConflict {
    pub fn is_empty(&self) -> bool {
        self.missing_operational_intents.is_empty() && self.missing_constraints.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum ScdError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: EntityKind, id: String },

    #[error("version mismatch: {0}")]
    VersionMismatch(String),

    #[error(
        "missing OVNs for {} operational intent(s) and {} constraint(s)",
        .0.missing_operational_intents.len(),
        .0.missing_constraints.len()
    )]
    MissingOvns(Box<AirspaceConflict>),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ScdError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScdError::Geometry(_) | ScdError::Model(_) | ScdError::BadRequest(_) => {
                ErrorKind::BadRequest
            }
            ScdError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            ScdError::NotFound { .. } => ErrorKind::NotFound,
            ScdError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            ScdError::VersionMismatch(_) => ErrorKind::VersionMismatch,
            ScdError::MissingOvns(_) => ErrorKind::MissingOvns,
            ScdError::Storage(_) | ScdError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The conflict details of a [`ErrorKind::MissingOvns`] error.
    pub fn conflict(&self) -> Option<&AirspaceConflict> {
        match self {
            ScdError::MissingOvns(conflict) => Some(conflict),
            _ => None,
        }
    }

    pub(crate) fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        ScdError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn already_exists(kind: EntityKind, id: impl fmt::Display) -> Self {
        ScdError::AlreadyExists {
            kind,
            id: id.to_string(),
        }
    }
}

impl Retryable for ScdError {
    fn is_retryable(&self) -> bool {
        matches!(self, ScdError::Storage(e) if e.is_retryable())
    }
}
