// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
#![no_main]
use libfuzzer_sys::fuzz_target;
use tokenyard::breaking::BreakingChangeReport;
use tokenyard::diff::DEFAULT_RENAME_THRESHOLD;
use tokenyard::tokens::{count_leaves, flatten};

/// Max input size to prevent pathological parse times
const MAX_INPUT_SIZE: usize = 16 * 1024;

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_INPUT_SIZE {
        return;
    }
    let Ok(tree) = serde_json::from_slice::<serde_json::Value>(data) else { return };

    let flat = flatten(&tree);
    assert!(flat.len() <= count_leaves(&tree));

    let report = BreakingChangeReport::generate("a", "b", &flat, &flat, DEFAULT_RENAME_THRESHOLD);
    assert!(!report.has_breaking());
});
