// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Constraint references.

use chrono::{DateTime, Utc};
use dss_geo::{CellSet, IndexedVolume4D};
use serde::{Deserialize, Serialize};

use crate::{EntityId, Manager, Ovn, SpatialEntity, UssAvailability};

/// A stored constraint reference. Constraints carry no subscription of
/// their own; other managers learn about them through area subscriptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: EntityId,
    pub manager: Manager,
    pub version: u64,
    pub ovn: Ovn,
    #[serde(default)]
    pub past_ovns: Vec<Ovn>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub altitude_lower: Option<f64>,
    pub altitude_upper: Option<f64>,
    pub uss_base_url: String,
    pub cells: CellSet,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_deserializing, default)]
    pub uss_availability: UssAvailability,
}

impl Constraint {
    pub fn redacted_for(&self, viewer: &Manager) -> Self {
        let mut out = self.clone();
        if &self.manager != viewer {
            out.ovn = Ovn::redacted();
            out.past_ovns.clear();
        }
        out
    }
}

impl SpatialEntity for Constraint {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn manager(&self) -> &Manager {
        &self.manager
    }

    fn extent(&self) -> IndexedVolume4D {
        IndexedVolume4D {
            start_time: self.start_time,
            end_time: self.end_time,
            altitude_lower: self.altitude_lower,
            altitude_upper: self.altitude_upper,
            cells: self.cells.clone(),
        }
    }

    fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
