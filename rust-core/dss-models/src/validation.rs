// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Field validation shared by all record kinds.

use chrono::{DateTime, Utc};
use url::Url;

use crate::ModelError;

/// Require an absolute `https` URL with a host. Plain `http` is accepted
/// only when `allow_http` is set (local test deployments).
pub fn validate_base_url(raw: &str, allow_http: bool) -> Result<(), ModelError> {
    let invalid = |reason: &str| ModelError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    if raw.is_empty() {
        return Err(ModelError::MissingField("uss_base_url"));
    }
    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    match url.scheme() {
        "https" => {}
        "http" if allow_http => {}
        "http" => return Err(invalid("https is required")),
        other => return Err(invalid(&format!("unsupported scheme `{other}`"))),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(())
}

/// Both bounds present, ordered, and the end not already in the past.
pub fn validate_time_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ModelError> {
    let start = start.ok_or(ModelError::MissingField("start time"))?;
    let end = end.ok_or(ModelError::MissingField("end time"))?;
    if end < start {
        return Err(ModelError::InvalidTimeRange(format!(
            "end {} precedes start {}",
            end.to_rfc3339(),
            start.to_rfc3339()
        )));
    }
    if end < now {
        return Err(ModelError::InvalidTimeRange(format!(
            "end {} is in the past",
            end.to_rfc3339()
        )));
    }
    Ok((start, end))
}
