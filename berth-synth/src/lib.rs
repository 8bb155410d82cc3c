//! Synthesis engine for berth deployments.
//!
//! Generates secrets, mints signed role tokens, assigns conflict-free host
//! ports to a fixed service topology, and patches fields in existing
//! configuration text.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod allocator;
pub mod config;
pub mod error;
pub mod minter;
pub mod patch;
pub mod prober;
pub mod secret;
pub mod synthesis;

pub use allocator::{random_start, PortAllocator};
pub use config::{
    SynthConfig, TokenPolicy, DEFAULT_ISSUER, DEFAULT_MAX_PROBE_ATTEMPTS, DEFAULT_SECRET_LENGTH,
    DEFAULT_SIGNING_SECRET_LENGTH,
};
pub use error::SynthError;
pub use minter::{canonical_json, decode_claims, mint, mint_role_token, verify};
pub use patch::{backup_path, patch_fields, EnvLinePatcher, FieldPatcher, Patched};
pub use prober::{PortProber, TcpProber};
pub use secret::SecretGenerator;
pub use synthesis::{synthesize, Credentials, Synthesis};
