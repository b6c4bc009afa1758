// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
#![no_main]
use libfuzzer_sys::fuzz_target;
use tokenyard::metadata::SemVer;

const MAX_INPUT_SIZE: usize = 256;

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_INPUT_SIZE {
        return;
    }
    let Ok(s) = std::str::from_utf8(data) else { return };
    if let Ok(v) = SemVer::parse(s) {
        let again = SemVer::parse(&v.to_string()).expect("display output must parse");
        assert_eq!(again, v);
    }
});
