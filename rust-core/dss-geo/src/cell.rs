// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Cell ids and cube-face projection.
//!
//! A cell id packs `face (3 bits) | Hilbert position (2 bits per level) |
//! sentinel 1 bit` into a `u64`, so ids from different levels never collide
//! and ids at one level sort along the Hilbert curve. The projection from the
//! sphere to a face uses the gnomonic (u, v) coordinates followed by the
//! quadratic (s, t) area-equalising transform.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The single level at which every covering is computed (~1.27 km² cells).
pub const CELL_LEVEL: u8 = 13;

/// Deepest level of the hierarchy.
pub const MAX_LEVEL: u8 = 30;

const MAX_SIZE: u32 = 1 << MAX_LEVEL;
const POS_BITS: u32 = 2 * MAX_LEVEL as u32 + 1;
const SWAP_MASK: usize = 0x01;
const INVERT_MASK: usize = 0x02;

/// Hilbert position of sub-cell `(i_bit << 1) | j_bit` for each orientation.
const IJ_TO_POS: [[u8; 4]; 4] = [
    [0, 1, 3, 2], // canonical
    [0, 3, 1, 2], // axes swapped
    [2, 3, 1, 0], // bits inverted
    [2, 1, 3, 0], // swapped & inverted
];

/// Orientation change applied after descending into sub-cell `pos`.
const POS_TO_ORIENTATION: [usize; 4] = [SWAP_MASK, 0, 0, INVERT_MASK | SWAP_MASK];

/// Identifier of one cell in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(u64);

impl CellId {
    /// Wrap a raw id. No validation is performed; see [`CellId::is_valid`].
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Build the id of the cell at `level` containing the leaf position
    /// `(i, j)` on `face`.
    pub fn from_face_ij(face: u8, i: u32, j: u32, level: u8) -> Self {
        let level = level.min(MAX_LEVEL) as u32;
        let mut pos: u64 = 0;
        let mut orientation = face as usize & SWAP_MASK;

        for k in (MAX_LEVEL as u32 - level..MAX_LEVEL as u32).rev() {
            let ij = (((i >> k) & 1) << 1 | ((j >> k) & 1)) as usize;
            let sub = IJ_TO_POS[orientation][ij];
            pos = (pos << 2) | sub as u64;
            orientation ^= POS_TO_ORIENTATION[sub as usize];
        }

        let lsb_shift = 2 * (MAX_LEVEL as u32 - level);
        Self(((face as u64) << POS_BITS) | (pos << (lsb_shift + 1)) | (1u64 << lsb_shift))
    }

    /// The cell at `level` containing the given latitude/longitude (degrees).
    pub fn from_lat_lng(lat: f64, lng: f64, level: u8) -> Self {
        let p = Point3::from_lat_lng(lat, lng);
        let face = p.face();
        let (u, v) = p.face_uv(face);
        let i = st_to_ij(uv_to_st(u));
        let j = st_to_ij(uv_to_st(v));
        Self::from_face_ij(face, i, j, level)
    }

    /// Raw 64-bit value, as persisted in the spatial index.
    pub fn id(self) -> u64 {
        self.0
    }

    /// Cube face (0..=5).
    pub fn face(self) -> u8 {
        (self.0 >> POS_BITS) as u8
    }

    /// Level of this cell (0 = whole face, 30 = leaf).
    pub fn level(self) -> u8 {
        MAX_LEVEL - (self.0.trailing_zeros() / 2) as u8
    }

    /// True when the face is in range and the sentinel bit sits at an even
    /// offset.
    pub fn is_valid(self) -> bool {
        let tz = self.0.trailing_zeros();
        self.face() < 6 && tz < POS_BITS && tz % 2 == 0
    }

    /// Compact hex form with trailing zero nibbles removed.
    pub fn to_token(self) -> String {
        if self.0 == 0 {
            return "X".to_string();
        }
        let hex = format!("{:016x}", self.0);
        hex.trim_end_matches('0').to_string()
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_token())
    }
}

/// Ordered, de-duplicated set of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellSet(BTreeSet<CellId>);

impl CellSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cell: CellId) -> bool {
        self.0.insert(cell)
    }

    pub fn contains(&self, cell: &CellId) -> bool {
        self.0.contains(cell)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellId> + '_ {
        self.0.iter()
    }

    /// Add every cell of `other` to this set.
    pub fn extend_from(&mut self, other: &CellSet) {
        self.0.extend(other.0.iter().copied());
    }

    /// True if at least one cell is shared.
    pub fn intersects(&self, other: &CellSet) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.0.iter().any(|c| large.0.contains(c))
    }

    /// True if every cell of `other` is in this set.
    pub fn is_superset(&self, other: &CellSet) -> bool {
        self.0.is_superset(&other.0)
    }
}

impl FromIterator<CellId> for CellSet {
    fn from_iter<I: IntoIterator<Item = CellId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for CellSet {
    type Item = CellId;
    type IntoIter = std::collections::btree_set::IntoIter<CellId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// A point in 3D space; unit length when it represents a position on the
/// sphere, arbitrary length for clipped chord points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_lat_lng(lat: f64, lng: f64) -> Self {
        let (phi, theta) = (lat.to_radians(), lng.to_radians());
        Self::new(phi.cos() * theta.cos(), phi.cos() * theta.sin(), phi.sin())
    }

    pub fn dot(self, o: Point3) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    pub fn add(self, o: Point3) -> Point3 {
        Point3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }

    pub fn sub(self, o: Point3) -> Point3 {
        Point3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }

    pub fn scale(self, k: f64) -> Point3 {
        Point3::new(self.x * k, self.y * k, self.z * k)
    }

    /// Face whose axis has the largest absolute component.
    pub fn face(self) -> u8 {
        let (ax, ay, az) = (self.x.abs(), self.y.abs(), self.z.abs());
        let (axis, value) = if ax >= ay && ax >= az {
            (0, self.x)
        } else if ay >= az {
            (1, self.y)
        } else {
            (2, self.z)
        };
        if value < 0.0 {
            axis + 3
        } else {
            axis
        }
    }

    /// Gnomonic coordinates on `face`. Only meaningful when the point lies
    /// in front of that face.
    pub fn face_uv(self, face: u8) -> (f64, f64) {
        let axes = FaceAxes::of(face);
        let n = self.dot(axes.normal);
        (self.dot(axes.u) / n, self.dot(axes.v) / n)
    }
}

/// Normal and (u, v) axes of a cube face.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FaceAxes {
    pub normal: Point3,
    pub u: Point3,
    pub v: Point3,
}

impl FaceAxes {
    pub fn of(face: u8) -> Self {
        let p = Point3::new;
        match face {
            0 => Self { normal: p(1.0, 0.0, 0.0), u: p(0.0, 1.0, 0.0), v: p(0.0, 0.0, 1.0) },
            1 => Self { normal: p(0.0, 1.0, 0.0), u: p(-1.0, 0.0, 0.0), v: p(0.0, 0.0, 1.0) },
            2 => Self { normal: p(0.0, 0.0, 1.0), u: p(-1.0, 0.0, 0.0), v: p(0.0, -1.0, 0.0) },
            3 => Self { normal: p(-1.0, 0.0, 0.0), u: p(0.0, 0.0, -1.0), v: p(0.0, -1.0, 0.0) },
            4 => Self { normal: p(0.0, -1.0, 0.0), u: p(0.0, 0.0, -1.0), v: p(1.0, 0.0, 0.0) },
            _ => Self { normal: p(0.0, 0.0, -1.0), u: p(0.0, 1.0, 0.0), v: p(1.0, 0.0, 0.0) },
        }
    }

    /// The four half-spaces (through the origin) whose intersection is the
    /// pyramid subtended by the face: `p·(n ∓ u) >= 0`, `p·(n ∓ v) >= 0`.
    pub fn bounding_planes(&self) -> [Point3; 4] {
        [
            self.normal.sub(self.u),
            self.normal.add(self.u),
            self.normal.sub(self.v),
            self.normal.add(self.v),
        ]
    }
}

pub(crate) fn uv_to_st(u: f64) -> f64 {
    if u >= 0.0 {
        0.5 * (1.0 + 3.0 * u).sqrt()
    } else {
        1.0 - 0.5 * (1.0 - 3.0 * u).sqrt()
    }
}

pub(crate) fn st_to_uv(s: f64) -> f64 {
    if s >= 0.5 {
        (1.0 / 3.0) * (4.0 * s * s - 1.0)
    } else {
        (1.0 / 3.0) * (1.0 - 4.0 * (1.0 - s) * (1.0 - s))
    }
}

pub(crate) fn st_to_ij(s: f64) -> u32 {
    let scaled = (MAX_SIZE as f64 * s).floor();
    scaled.clamp(0.0, (MAX_SIZE - 1) as f64) as u32
}

/// Number of cells along one face axis at `level`.
pub(crate) fn cells_per_axis(level: u8) -> u32 {
    1u32 << level.min(MAX_LEVEL)
}

/// Index of the level-`level` cell containing `s` along one axis.
pub(crate) fn st_to_cell_index(s: f64, level: u8) -> u32 {
    st_to_ij(s) >> (MAX_LEVEL - level.min(MAX_LEVEL))
}

/// Leaf coordinate of the lower corner of cell index `index` at `level`.
pub(crate) fn cell_index_to_leaf(index: u32, level: u8) -> u32 {
    index << (MAX_LEVEL - level.min(MAX_LEVEL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_roundtrip() {
        for level in [0u8, 1, 5, 13, 30] {
            let cell = CellId::from_face_ij(3, 12345, 67890, level);
            assert_eq!(cell.level(), level);
            assert_eq!(cell.face(), 3);
            assert!(cell.is_valid());
        }
    }

    #[test]
    fn test_face_zero_level_zero() {
        // The whole of face 0 is 0x1000000000000000.
        let cell = CellId::from_face_ij(0, 0, 0, 0);
        assert_eq!(cell.id(), 1u64 << 60);
        assert_eq!(cell.to_token(), "1");
    }

    #[test]
    fn test_face_of_axes() {
        assert_eq!(Point3::from_lat_lng(0.0, 0.0).face(), 0);
        assert_eq!(Point3::from_lat_lng(0.0, 90.0).face(), 1);
        assert_eq!(Point3::from_lat_lng(90.0, 0.0).face(), 2);
        assert_eq!(Point3::from_lat_lng(0.0, 180.0).face(), 3);
        assert_eq!(Point3::from_lat_lng(0.0, -90.0).face(), 4);
        assert_eq!(Point3::from_lat_lng(-90.0, 0.0).face(), 5);
    }

    #[test]
    fn test_st_uv_inverse() {
        for u in [-1.0, -0.5, -0.1, 0.0, 0.3, 0.99, 1.0] {
            let back = st_to_uv(uv_to_st(u));
            assert!((back - u).abs() < 1e-12, "u={u} came back as {back}");
        }
    }

    #[test]
    fn test_nearby_points_share_cell() {
        let a = CellId::from_lat_lng(37.4275, -122.1697, CELL_LEVEL);
        let b = CellId::from_lat_lng(37.42751, -122.16971, CELL_LEVEL);
        let far = CellId::from_lat_lng(37.5, -122.0, CELL_LEVEL);
        assert_eq!(a, b);
        assert_ne!(a, far);
        assert_eq!(a.level(), CELL_LEVEL);
    }

    #[test]
    fn test_children_sort_within_parent() {
        // Adjacent leaf positions at level 13 produce distinct ids that all
        // share the same level-12 prefix.
        let parent_shift = 2 * (MAX_LEVEL - 12) as u32 + 1;
        let a = CellId::from_face_ij(1, 0, 0, 13);
        let b = CellId::from_face_ij(1, cell_index_to_leaf(1, 13), 0, 13);
        assert_ne!(a, b);
        assert_eq!(a.id() >> parent_shift, b.id() >> parent_shift);
    }

    #[test]
    fn test_cell_set_ops() {
        let c1 = CellId::from_face_ij(0, 0, 0, 13);
        let c2 = CellId::from_face_ij(0, cell_index_to_leaf(1, 13), 0, 13);
        let c3 = CellId::from_face_ij(0, cell_index_to_leaf(2, 13), 0, 13);

        let a: CellSet = [c1, c2].into_iter().collect();
        let b: CellSet = [c2, c3].into_iter().collect();
        let c: CellSet = [c3].into_iter().collect();

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));

        let mut u = a.clone();
        u.extend_from(&b);
        assert_eq!(u.len(), 3);
        assert!(u.is_superset(&a));
        assert!(!a.is_superset(&u));
    }

    #[test]
    fn test_invalid_ids() {
        assert!(!CellId::from_raw(0).is_valid());
        assert!(!CellId::from_raw(7u64 << 61 | 1).is_valid());
        assert!(!CellId::from_raw(0b10).is_valid());
    }
}
