// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! DSS Geo
//!
//! Spatial primitives shared by every entity kind in the DSS: footprints,
//! altitude/time bounded volumes and the fixed-level cell index used for
//! intersection queries.
//!
//! # Architecture
//!
//! - **Cells**: a cube-face, Hilbert-ordered hierarchical decomposition of the
//!   sphere. Only one level ([`CELL_LEVEL`]) is ever materialised so that
//!   coverings computed by different writers are directly comparable.
//! - **Geometry**: closed sum type of [`Circle`] and [`Polygon`]; both reduce
//!   to a spherical loop before being covered.
//! - **Volume3D / Volume4D**: request-side shapes (altitude band, optional
//!   time band, optional footprint).
//! - **IndexedVolume4D**: the resolved form stored with every entity. Its
//!   spatial part is a [`CellSet`], so several volumes can be unioned into one
//!   envelope without keeping their geometry around.

pub mod cell;
pub mod covering;
pub mod geometry;
pub mod volume;

use thiserror::Error;

pub use cell::{CellId, CellSet, CELL_LEVEL};
pub use covering::{CoveringConfig, DEFAULT_MAX_COVERING_CELLS};
pub use geometry::{Circle, Geometry, LatLng, Polygon};
pub use volume::{union_volumes_4d, IndexedVolume4D, Volume3D, Volume4D};

/// Geometry and volume validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A Volume4D was given without its spatial part.
    #[error("missing spatial volume")]
    MissingSpatialVolume,

    /// A Volume3D was given without a circle or polygon footprint.
    #[error("missing footprint: a circle or a polygon is required")]
    MissingFootprint,

    /// Polygon with fewer than three distinct vertices.
    #[error("not enough points in polygon: got {0}, need at least 3")]
    NotEnoughPointsInPolygon(usize),

    /// Latitude/longitude outside the WGS84 range, or not finite.
    #[error("bad coordinates: lat={lat}, lng={lng}")]
    BadCoordinates { lat: f64, lng: f64 },

    /// Circle radius is zero, negative or not finite.
    #[error("circle radius must be positive, got {0}")]
    RadiusNotPositive(f64),

    /// The covering needs more cells than the configured maximum.
    #[error("area too large: covering needs more than {max} cells")]
    AreaTooLarge { max: usize },

    /// Lower altitude bound above the upper bound.
    #[error("altitude lower bound {lower} is above upper bound {upper}")]
    InvalidAltitudeRange { lower: f64, upper: f64 },

    /// End time precedes start time.
    #[error("end time {end} precedes start time {start}")]
    EndBeforeStart { start: String, end: String },
}
