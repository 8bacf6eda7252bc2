// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Spatio-temporal volumes.
//!
//! [`Volume4D`] is what clients send; [`IndexedVolume4D`] is what the store
//! keeps and searches on. Turning the former into the latter validates the
//! geometry and computes the covering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cell::CellSet;
use crate::covering::CoveringConfig;
use crate::geometry::Geometry;
use crate::GeometryError;

/// An altitude band (metres, WGS84) over an optional footprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume3D {
    pub altitude_lower: Option<f64>,
    pub altitude_upper: Option<f64>,
    pub footprint: Option<Geometry>,
}

impl Volume3D {
    pub fn new(footprint: Geometry, altitude_lower: Option<f64>, altitude_upper: Option<f64>) -> Self {
        Self {
            altitude_lower,
            altitude_upper,
            footprint: Some(footprint),
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if let (Some(lower), Some(upper)) = (self.altitude_lower, self.altitude_upper) {
            if lower > upper {
                return Err(GeometryError::InvalidAltitudeRange { lower, upper });
            }
        }
        Ok(())
    }

    pub fn calculate_covering(&self) -> Result<CellSet, GeometryError> {
        self.calculate_covering_with(&CoveringConfig::default())
    }

    pub fn calculate_covering_with(
        &self,
        config: &CoveringConfig,
    ) -> Result<CellSet, GeometryError> {
        self.validate()?;
        self.footprint
            .as_ref()
            .ok_or(GeometryError::MissingFootprint)?
            .calculate_covering_with(config)
    }
}

/// A [`Volume3D`] with an optional time band.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume4D {
    pub spatial_volume: Option<Volume3D>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Volume4D {
    pub fn new(
        spatial_volume: Volume3D,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            spatial_volume: Some(spatial_volume),
            start_time,
            end_time,
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        check_time_order(self.start_time, self.end_time)?;
        self.spatial_volume
            .as_ref()
            .ok_or(GeometryError::MissingSpatialVolume)?
            .validate()
    }

    pub fn calculate_covering(&self) -> Result<CellSet, GeometryError> {
        self.calculate_covering_with(&CoveringConfig::default())
    }

    pub fn calculate_covering_with(
        &self,
        config: &CoveringConfig,
    ) -> Result<CellSet, GeometryError> {
        check_time_order(self.start_time, self.end_time)?;
        self.spatial_volume
            .as_ref()
            .ok_or(GeometryError::MissingSpatialVolume)?
            .calculate_covering_with(config)
    }

    /// Validate and resolve into the stored/searchable form.
    pub fn to_indexed(&self, config: &CoveringConfig) -> Result<IndexedVolume4D, GeometryError> {
        let cells = self.calculate_covering_with(config)?;
        let spatial = self
            .spatial_volume
            .as_ref()
            .ok_or(GeometryError::MissingSpatialVolume)?;
        Ok(IndexedVolume4D {
            start_time: self.start_time,
            end_time: self.end_time,
            altitude_lower: spatial.altitude_lower,
            altitude_upper: spatial.altitude_upper,
            cells,
        })
    }
}

fn check_time_order(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), GeometryError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(GeometryError::EndBeforeStart {
            start: start.to_rfc3339(),
            end: end.to_rfc3339(),
        }),
        _ => Ok(()),
    }
}

/// A resolved spatio-temporal envelope: time band, altitude band and cells.
///
/// Absent bounds are unbounded for intersection purposes and are ignored
/// when unioning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexedVolume4D {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub altitude_lower: Option<f64>,
    pub altitude_upper: Option<f64>,
    pub cells: CellSet,
}

impl IndexedVolume4D {
    /// Grow this envelope to also span `other`.
    pub fn union_with(&mut self, other: &IndexedVolume4D) {
        self.start_time = min_opt(self.start_time, other.start_time);
        self.end_time = max_opt(self.end_time, other.end_time);
        self.altitude_lower = min_opt_f64(self.altitude_lower, other.altitude_lower);
        self.altitude_upper = max_opt_f64(self.altitude_upper, other.altitude_upper);
        self.cells.extend_from(&other.cells);
    }

    /// Envelope spanning both `self` and `other`.
    pub fn union(&self, other: &IndexedVolume4D) -> IndexedVolume4D {
        let mut out = self.clone();
        out.union_with(other);
        out
    }

    /// Cells, time band and altitude band all overlap. Bounds are inclusive.
    pub fn intersects(&self, other: &IndexedVolume4D) -> bool {
        self.overlaps_time(other) && self.overlaps_altitude(other) && self.cells.intersects(&other.cells)
    }

    pub fn overlaps_time(&self, other: &IndexedVolume4D) -> bool {
        let starts_before_other_ends = match (self.start_time, other.end_time) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        };
        let ends_after_other_starts = match (self.end_time, other.start_time) {
            (Some(end), Some(start)) => end >= start,
            _ => true,
        };
        starts_before_other_ends && ends_after_other_starts
    }

    pub fn overlaps_altitude(&self, other: &IndexedVolume4D) -> bool {
        let lower_ok = match (self.altitude_lower, other.altitude_upper) {
            (Some(lower), Some(upper)) => lower <= upper,
            _ => true,
        };
        let upper_ok = match (self.altitude_upper, other.altitude_lower) {
            (Some(upper), Some(lower)) => upper >= lower,
            _ => true,
        };
        lower_ok && upper_ok
    }

    /// `other` lies entirely within this envelope. Unbounded sides of `self`
    /// cover anything; bounded sides of `self` do not cover an unbounded side
    /// of `other`.
    pub fn covers(&self, other: &IndexedVolume4D) -> bool {
        let start_ok = match (self.start_time, other.start_time) {
            (None, _) => true,
            (Some(mine), Some(theirs)) => mine <= theirs,
            (Some(_), None) => false,
        };
        let end_ok = match (self.end_time, other.end_time) {
            (None, _) => true,
            (Some(mine), Some(theirs)) => mine >= theirs,
            (Some(_), None) => false,
        };
        let lower_ok = match (self.altitude_lower, other.altitude_lower) {
            (None, _) => true,
            (Some(mine), Some(theirs)) => mine <= theirs,
            (Some(_), None) => false,
        };
        let upper_ok = match (self.altitude_upper, other.altitude_upper) {
            (None, _) => true,
            (Some(mine), Some(theirs)) => mine >= theirs,
            (Some(_), None) => false,
        };
        start_ok && end_ok && lower_ok && upper_ok && self.cells.is_superset(&other.cells)
    }
}

fn min_opt<T: Ord + Copy>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn max_opt<T: Ord + Copy>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn min_opt_f64(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn max_opt_f64(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Resolve every volume and union them into one bounding envelope.
///
/// Returns an empty envelope for an empty slice.
pub fn union_volumes_4d(
    volumes: &[Volume4D],
    config: &CoveringConfig,
) -> Result<IndexedVolume4D, GeometryError> {
    let mut iter = volumes.iter();
    let mut result = match iter.next() {
        Some(first) => first.to_indexed(config)?,
        None => return Ok(IndexedVolume4D::default()),
    };
    for volume in iter {
        result.union_with(&volume.to_indexed(config)?);
    }
    Ok(result)
}
