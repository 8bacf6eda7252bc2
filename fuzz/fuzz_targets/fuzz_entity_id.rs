// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// Fuzz target for entity id and requested OVN parsing

#![no_main]

use dss_models::{EntityId, Ovn};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(id) = EntityId::parse(s) {
            // Parsed ids round-trip through their canonical form.
            let again = EntityId::parse(id.as_str()).unwrap();
            assert_eq!(again, id);

            if let Ok(ovn) = Ovn::from_requested_suffix(&id, s) {
                assert!(ovn.validate_length().is_ok());
            }
        }
    }
});
