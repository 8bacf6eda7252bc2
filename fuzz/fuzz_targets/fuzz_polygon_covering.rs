// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// Fuzz target for polygon validation and covering

#![no_main]

use dss_geo::{CoveringConfig, Geometry, LatLng, Polygon};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Every 16 bytes is one (lat, lng) vertex; arbitrary bit patterns
    // include NaN, infinities and out-of-range values.
    let vertices: Vec<LatLng> = data
        .chunks_exact(16)
        .take(64)
        .map(|chunk| {
            let mut lat = [0u8; 8];
            let mut lng = [0u8; 8];
            lat.copy_from_slice(&chunk[..8]);
            lng.copy_from_slice(&chunk[8..]);
            LatLng::new(f64::from_le_bytes(lat), f64::from_le_bytes(lng))
        })
        .collect();

    let geometry = Geometry::Polygon(Polygon::new(vertices));
    let config = CoveringConfig { max_cells: 500 };
    if let Ok(cells) = geometry.calculate_covering_with(&config) {
        assert!(!cells.is_empty());
        assert!(cells.len() <= config.max_cells);
    }
});
