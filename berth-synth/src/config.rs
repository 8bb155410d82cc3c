//! Engine configuration and token policy.

use std::ops::RangeInclusive;
use std::time::Duration;

use berth_core::Topology;
use serde::{Deserialize, Serialize};

/// Default length for generic credentials (passwords, API keys).
pub const DEFAULT_SECRET_LENGTH: usize = 32;

/// Default length for the token signing secret.
pub const DEFAULT_SIGNING_SECRET_LENGTH: usize = 48;

/// Default length for the realtime service's session key base.
pub const DEFAULT_SECRET_KEY_BASE_LENGTH: usize = 64;

/// Probe budget per service before the allocation pass gives up.
pub const DEFAULT_MAX_PROBE_ATTEMPTS: u32 = 1024;

/// Issuer written into minted tokens.
pub const DEFAULT_ISSUER: &str = "supabase";

/// Roughly ten years.
pub const DEFAULT_TOKEN_VALIDITY_DAYS: u32 = 3650;

/// How long minted role tokens stay valid and who issues them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct TokenPolicy {
    /// Value of the `iss` claim.
    pub issuer: String,
    /// Validity window in days.
    pub validity_days: u32,
}

impl TokenPolicy {
    /// Policy with a custom issuer and validity.
    pub fn new(issuer: impl Into<String>, validity_days: u32) -> Self {
        Self { issuer: issuer.into(), validity_days }
    }

    /// Policy valid for `years` years of 365 days.
    #[must_use]
    pub fn with_years(years: u32) -> Self {
        Self::new(DEFAULT_ISSUER, years.saturating_mul(365))
    }

    /// The validity window as a `chrono` duration.
    #[must_use]
    pub fn validity(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.validity_days))
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ISSUER, DEFAULT_TOKEN_VALIDITY_DAYS)
    }
}

/// Configuration for one synthesis run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct SynthConfig {
    /// Length of generic credentials.
    pub secret_length: usize,

    /// Length of the token signing secret.
    pub signing_secret_length: usize,

    /// Length of the realtime `SECRET_KEY_BASE`.
    pub secret_key_base_length: usize,

    /// Range a random base port is drawn from when none is given.
    pub base_port_range: RangeInclusive<u16>,

    /// Maximum probes per service.
    pub max_probe_attempts: u32,

    /// Connect timeout for a single port probe.
    pub probe_timeout: Duration,

    /// Host the probes connect to.
    pub probe_host: String,

    /// Services and their offsets.
    pub topology: Topology,

    /// Issuer and validity for role tokens.
    pub token_policy: TokenPolicy,
}

impl SynthConfig {
    /// Create a config with the standard topology and default lengths.
    #[must_use]
    pub fn new() -> Self {
        Self {
            secret_length: DEFAULT_SECRET_LENGTH,
            signing_secret_length: DEFAULT_SIGNING_SECRET_LENGTH,
            secret_key_base_length: DEFAULT_SECRET_KEY_BASE_LENGTH,
            base_port_range: 3000..=9000,
            max_probe_attempts: DEFAULT_MAX_PROBE_ATTEMPTS,
            probe_timeout: Duration::from_millis(250),
            probe_host: "localhost".to_owned(),
            topology: Topology::standard(),
            token_policy: TokenPolicy::default(),
        }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self::new()
    }
}
