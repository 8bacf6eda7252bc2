// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Loop covering at the fixed cell level.
//!
//! The loop is clipped against the pyramid of each cube face in 3D. Because
//! a great-circle edge and its chord span the same plane through the origin,
//! clipping the chord polygon with planes through the origin yields exactly
//! the spherical polygon restricted to that face. After the gnomonic
//! projection, edges are straight lines and cells are axis-aligned
//! rectangles, so the cell test is plain 2D geometry.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cell::{
    cell_index_to_leaf, cells_per_axis, st_to_cell_index, st_to_uv, uv_to_st, CellId, CellSet,
    FaceAxes, Point3, CELL_LEVEL,
};
use crate::GeometryError;

/// Default cell budget: roughly 2500 km² at level 13.
pub const DEFAULT_MAX_COVERING_CELLS: usize = 2000;

/// Upper bound on the candidate cells examined per face before giving up.
const MAX_CANDIDATES_PER_FACE: u64 = 1_000_000;

/// Covering limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveringConfig {
    /// Coverings with more cells than this fail with
    /// [`GeometryError::AreaTooLarge`].
    pub max_cells: usize,
}

impl Default for CoveringConfig {
    fn default() -> Self {
        Self {
            max_cells: DEFAULT_MAX_COVERING_CELLS,
        }
    }
}

/// Axis-aligned rectangle in (u, v) face coordinates.
#[derive(Debug, Clone, Copy)]
struct UvRect {
    u_lo: f64,
    u_hi: f64,
    v_lo: f64,
    v_hi: f64,
}

impl UvRect {
    fn cell(i: u32, j: u32, level: u8) -> Self {
        let n = cells_per_axis(level) as f64;
        Self {
            u_lo: st_to_uv(i as f64 / n),
            u_hi: st_to_uv((i + 1) as f64 / n),
            v_lo: st_to_uv(j as f64 / n),
            v_hi: st_to_uv((j + 1) as f64 / n),
        }
    }

    fn center(&self) -> (f64, f64) {
        ((self.u_lo + self.u_hi) / 2.0, (self.v_lo + self.v_hi) / 2.0)
    }
}

/// Cover the spherical loop `vertices` (unit vectors, implicitly closed).
pub(crate) fn cover_loop(
    vertices: &[Point3],
    config: &CoveringConfig,
) -> Result<CellSet, GeometryError> {
    let mut cells = CellSet::new();

    for face in 0..6u8 {
        let clipped = clip_to_face(vertices, face);
        if clipped.len() < 3 {
            continue;
        }
        let uv: Vec<(f64, f64)> = clipped.iter().map(|p| p.face_uv(face)).collect();
        cover_face(face, &uv, config, &mut cells)?;
    }

    debug!(cells = cells.len(), "computed covering");
    Ok(cells)
}

fn cover_face(
    face: u8,
    uv: &[(f64, f64)],
    config: &CoveringConfig,
    cells: &mut CellSet,
) -> Result<(), GeometryError> {
    let (mut u_min, mut u_max, mut v_min, mut v_max) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for &(u, v) in uv {
        u_min = u_min.min(u);
        u_max = u_max.max(u);
        v_min = v_min.min(v);
        v_max = v_max.max(v);
    }

    let clamp = |x: f64| x.clamp(-1.0, 1.0);
    let i0 = st_to_cell_index(uv_to_st(clamp(u_min)), CELL_LEVEL);
    let i1 = st_to_cell_index(uv_to_st(clamp(u_max)), CELL_LEVEL);
    let j0 = st_to_cell_index(uv_to_st(clamp(v_min)), CELL_LEVEL);
    let j1 = st_to_cell_index(uv_to_st(clamp(v_max)), CELL_LEVEL);

    let candidates = (i1 - i0 + 1) as u64 * (j1 - j0 + 1) as u64;
    if candidates > MAX_CANDIDATES_PER_FACE {
        return Err(GeometryError::AreaTooLarge {
            max: config.max_cells,
        });
    }

    for i in i0..=i1 {
        for j in j0..=j1 {
            let rect = UvRect::cell(i, j, CELL_LEVEL);
            if rect_intersects_polygon(&rect, uv) {
                cells.insert(CellId::from_face_ij(
                    face,
                    cell_index_to_leaf(i, CELL_LEVEL),
                    cell_index_to_leaf(j, CELL_LEVEL),
                    CELL_LEVEL,
                ));
                if cells.len() > config.max_cells {
                    return Err(GeometryError::AreaTooLarge {
                        max: config.max_cells,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Sutherland–Hodgman clip of the chord polygon against the face pyramid.
fn clip_to_face(vertices: &[Point3], face: u8) -> Vec<Point3> {
    let axes = FaceAxes::of(face);
    let mut output: Vec<Point3> = vertices.to_vec();

    for plane in axes.bounding_planes() {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let mut prev = input[input.len() - 1];
        let mut prev_d = prev.dot(plane);

        for &curr in &input {
            let curr_d = curr.dot(plane);
            if curr_d >= 0.0 {
                if prev_d < 0.0 {
                    output.push(intersect(prev, prev_d, curr, curr_d));
                }
                output.push(curr);
            } else if prev_d >= 0.0 {
                output.push(intersect(prev, prev_d, curr, curr_d));
            }
            prev = curr;
            prev_d = curr_d;
        }
    }

    // Drop degenerate points left at the pyramid apex.
    output.retain(|p| p.dot(axes.normal) > 0.0);
    output
}

fn intersect(a: Point3, da: f64, b: Point3, db: f64) -> Point3 {
    let t = da / (da - db);
    a.add(b.sub(a).scale(t))
}

fn rect_intersects_polygon(rect: &UvRect, poly: &[(f64, f64)]) -> bool {
    let n = poly.len();
    let edge_hit = (0..n).any(|k| segment_intersects_rect(poly[k], poly[(k + 1) % n], rect));
    edge_hit || point_in_polygon(rect.center(), poly)
}

/// Liang–Barsky: does segment `a`→`b` touch the closed rectangle?
fn segment_intersects_rect(a: (f64, f64), b: (f64, f64), rect: &UvRect) -> bool {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    let checks = [
        (-dx, a.0 - rect.u_lo),
        (dx, rect.u_hi - a.0),
        (-dy, a.1 - rect.v_lo),
        (dy, rect.v_hi - a.1),
    ];

    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return false;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return false;
            }
            t1 = t1.min(r);
        }
    }
    true
}

/// Even-odd ray casting.
fn point_in_polygon(pt: (f64, f64), poly: &[(f64, f64)]) -> bool {
    let (x, y) = pt;
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let (xi, yi) = poly[i];
        let (xj, yj) = poly[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
