//! Error types for the synthesis engine.

use berth_core::{CoreError, Service};

/// Errors that can occur while synthesizing ports, secrets, and tokens.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SynthError {
    /// No free port was found inside the bounded search window.
    #[error(
        "no free port for {} in {start}..={last} after {attempts} probes",
        .service.map_or("probe", Service::key)
    )]
    PortExhausted {
        service: Option<Service>,
        start: u32,
        last: u32,
        attempts: u32,
    },

    /// A secret of non-positive length was requested.
    #[error("secret length must be positive, got {length}")]
    InvalidSecretLength { length: usize },

    /// Claims could not be encoded as a JSON object.
    #[error("claims encoding failed: {0}")]
    Encoding(String),

    /// The signing key is unusable (empty).
    #[error("signing key must not be empty")]
    InvalidKey,

    /// A token could not be split or decoded.
    #[error("malformed token: {reason}")]
    MalformedToken { reason: String },

    /// A field assignment cannot be written as a single `KEY=value` line.
    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// A domain invariant from `berth-core` was violated.
    #[error(transparent)]
    Core(#[from] CoreError),
}
