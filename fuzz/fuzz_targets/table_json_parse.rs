//! Fuzz target for JSON table loading (records or column layout).
//!
//! Run with:
//!   cargo +nightly fuzz run table_json_parse

#![no_main]

use cocofy::table::io_json::from_json_str;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(records) = from_json_str(text) {
        let _ = cocofy::convert(&records, &["cat"], None);
    }
});
