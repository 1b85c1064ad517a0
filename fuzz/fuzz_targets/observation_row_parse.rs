//! Fuzz target for typing loosely typed rows.
//!
//! Run with:
//!   cargo +nightly fuzz run observation_row_parse

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = cocofy::table::fuzz_parse_rows(text);
    }
});
