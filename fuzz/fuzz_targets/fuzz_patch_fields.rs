//! Fuzz target: field patching over arbitrary text.
//!
//! Patching must never panic, must be idempotent, and must leave the line
//! count unchanged.

#![no_main]

use berth_synth::patch_fields;
use indexmap::IndexMap;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let mut fields = IndexMap::new();
    fields.insert("JWT_SECRET".to_owned(), "fuzz".to_owned());
    fields.insert("A".to_owned(), String::new());

    let once = patch_fields(text, &fields).expect("valid fields must patch");
    let twice = patch_fields(&once.text, &fields).expect("valid fields must patch");
    assert_eq!(once.text, twice.text, "patching must be idempotent");
    assert_eq!(
        text.split_inclusive('\n').count(),
        once.text.split_inclusive('\n').count(),
        "patching must not add or drop lines"
    );
});
