// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Model validation errors.
//!
//! Every variant describes a malformed request; callers surface all of them
//! as bad requests.

use dss_geo::GeometryError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("invalid id `{0}`: expected a UUID")]
    InvalidId(String),

    #[error("manager identity must not be empty")]
    EmptyManager,

    #[error("invalid operational intent state `{0}`")]
    InvalidState(String),

    #[error("invalid state for initial version: `{0}`")]
    InvalidInitialState(String),

    #[error("invalid state transition from `{from}` to `{to}`")]
    InvalidStateTransition { from: String, to: String },

    #[error("invalid OVN: {0}")]
    InvalidOvn(String),

    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("subscription must notify for operational intents, constraints, or both")]
    NoNotificationTarget,

    #[error("invalid USS availability `{0}`")]
    InvalidAvailability(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
