//! Fuzz target: parsing `docker compose ps --format json` output.
//!
//! Unparsable lines are skipped; arbitrary output must never panic.

#![no_main]

use berth_cli::compose::parse_ps_output;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let _ = parse_ps_output(&text);
});
