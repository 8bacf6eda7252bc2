// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Footprint geometries.
//!
//! Exactly two footprints exist, so they are a closed enum rather than a
//! trait. Both validate themselves and reduce to a loop of vertices before
//! being handed to the coverer.

use serde::{Deserialize, Serialize};

use crate::cell::{CellSet, Point3};
use crate::covering::{cover_loop, CoveringConfig};
use crate::GeometryError;

/// Mean earth radius used to turn circle radii into angles, in metres.
pub const EARTH_RADIUS_METERS: f64 = 6_371_010.0;

/// Number of vertices of the regular polygon that stands in for a circle.
pub const CIRCLE_VERTICES: usize = 20;

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Reject non-finite values and anything outside [-90,90]×[-180,180].
    pub fn validate(&self) -> Result<(), GeometryError> {
        let in_range = self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng);
        if in_range {
            Ok(())
        } else {
            Err(GeometryError::BadCoordinates {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    pub(crate) fn to_point(self) -> Point3 {
        Point3::from_lat_lng(self.lat, self.lng)
    }

    /// The point reached by travelling `distance_m` metres from here along
    /// the great circle with initial bearing `bearing_deg` (clockwise from
    /// north).
    pub fn destination(&self, bearing_deg: f64, distance_m: f64) -> LatLng {
        let delta = distance_m / EARTH_RADIUS_METERS;
        let theta = bearing_deg.to_radians();
        let phi1 = self.lat.to_radians();
        let lambda1 = self.lng.to_radians();

        let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos();
        let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();
        let lambda2 = lambda1
            + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * sin_phi2);

        LatLng::new(phi2.to_degrees(), normalize_lng(lambda2.to_degrees()))
    }
}

fn normalize_lng(lng: f64) -> f64 {
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lng > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// A circular footprint: center plus radius in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: LatLng,
    pub radius_meters: f64,
}

impl Circle {
    pub fn new(center: LatLng, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters,
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if !(self.radius_meters.is_finite() && self.radius_meters > 0.0) {
            return Err(GeometryError::RadiusNotPositive(self.radius_meters));
        }
        self.center.validate()
    }

    /// The regular [`CIRCLE_VERTICES`]-gon inscribed in this circle.
    ///
    /// This is an approximation: slivers of the disk between the polygon
    /// edges and the arc are not covered.
    pub fn to_polygon(&self) -> Polygon {
        let step = 360.0 / CIRCLE_VERTICES as f64;
        let vertices = (0..CIRCLE_VERTICES)
            .map(|k| self.center.destination(k as f64 * step, self.radius_meters))
            .collect();
        Polygon { vertices }
    }
}

/// A polygonal footprint. Edges are great-circle arcs between consecutive
/// vertices; the loop is implicitly closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<LatLng>,
}

impl Polygon {
    pub fn new(vertices: Vec<LatLng>) -> Self {
        Self { vertices }
    }

    /// Vertices with a duplicated closing vertex removed.
    pub fn normalized_vertices(&self) -> &[LatLng] {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) if self.vertices.len() > 1 && first == last => {
                &self.vertices[..self.vertices.len() - 1]
            }
            _ => &self.vertices,
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        let vertices = self.normalized_vertices();
        if vertices.len() < 3 {
            return Err(GeometryError::NotEnoughPointsInPolygon(vertices.len()));
        }
        vertices.iter().try_for_each(LatLng::validate)
    }
}

/// The footprint of a [`crate::Volume3D`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    Circle(Circle),
    Polygon(Polygon),
}

impl Geometry {
    pub fn validate(&self) -> Result<(), GeometryError> {
        match self {
            Geometry::Circle(circle) => circle.validate(),
            Geometry::Polygon(polygon) => polygon.validate(),
        }
    }

    /// Cells at [`crate::CELL_LEVEL`] intersecting this footprint.
    pub fn calculate_covering(&self) -> Result<CellSet, GeometryError> {
        self.calculate_covering_with(&CoveringConfig::default())
    }

    pub fn calculate_covering_with(
        &self,
        config: &CoveringConfig,
    ) -> Result<CellSet, GeometryError> {
        self.validate()?;
        let polygon = match self {
            Geometry::Circle(circle) => circle.to_polygon(),
            Geometry::Polygon(polygon) => polygon.clone(),
        };
        let points: Vec<Point3> = polygon
            .normalized_vertices()
            .iter()
            .map(|v| v.to_point())
            .collect();
        cover_loop(&points, config)
    }
}
