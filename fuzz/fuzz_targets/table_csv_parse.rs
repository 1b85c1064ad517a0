//! Fuzz target for CSV table loading followed by conversion.
//!
//! Run with:
//!   cargo +nightly fuzz run table_csv_parse

#![no_main]

use cocofy::table::io_csv::from_csv_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    // Errors are fine; panics are not.
    if let Ok(records) = from_csv_slice(data) {
        let _ = cocofy::convert(&records, &["cat", "dog"], None);
    }
});
