//! Fuzz target: token verification and claims decoding on arbitrary input.
//!
//! Neither may panic; a token minted under one secret must never verify
//! after arbitrary bytes are appended to it.

#![no_main]

use berth_core::{Claims, Secret};
use berth_synth::{decode_claims, mint, verify};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let secret = Secret::new("fuzz-secret");

    let _ = verify(input, &secret);
    let _ = decode_claims(input);

    if input.is_empty() {
        return;
    }
    let claims = Claims::new("anon", input, 1, 2).expect("fixed window is valid");
    let token = mint(&claims, &secret).expect("string claims must mint");
    let tampered = format!("{token}{input}");
    assert!(!verify(&tampered, &secret), "appended bytes must break the signature");
});
