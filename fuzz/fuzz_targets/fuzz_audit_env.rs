//! Fuzz target: audit of arbitrary env text never panics.

#![no_main]

use berth_cli::audit::audit_env;
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let now = Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp");
    let _ = audit_env(text, now);
});
