// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Protocol configuration.

use std::time::Duration;

use dss_geo::{CoveringConfig, DEFAULT_MAX_COVERING_CELLS};
use serde::{Deserialize, Serialize};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Default age after which the eviction tool considers an entity expired.
pub const DEFAULT_EVICTION_TTL: Duration = Duration::from_secs(112 * 24 * 60 * 60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScdConfig {
    /// Accept plain `http` base URLs (local test deployments only).
    pub allow_http_base_urls: bool,
    /// Explicit subscriptions one manager may hold over any single cell.
    pub max_subscriptions_per_area: usize,
    /// Longest window an explicit subscription may span.
    pub max_subscription_duration: Duration,
    /// Window given to an explicit subscription that omits its end time.
    pub default_subscription_duration: Duration,
    /// Largest covering accepted for any footprint.
    pub max_covering_cells: usize,
}

impl ScdConfig {
    pub fn covering(&self) -> CoveringConfig {
        CoveringConfig {
            max_cells: self.max_covering_cells,
        }
    }
}

impl Default for ScdConfig {
    /// - allow_http_base_urls: false
    /// - max_subscriptions_per_area: 10
    /// - max_subscription_duration: 24h
    /// - default_subscription_duration: 24h
    /// - max_covering_cells: 2000 (roughly 2500 km² at the index level)
    fn default() -> Self {
        Self {
            allow_http_base_urls: false,
            max_subscriptions_per_area: 10,
            max_subscription_duration: DAY,
            default_subscription_duration: DAY,
            max_covering_cells: DEFAULT_MAX_COVERING_CELLS,
        }
    }
}

/// Convert a configured duration, saturating at chrono's range.
pub(crate) fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
