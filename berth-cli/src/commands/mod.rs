//! Subcommand handlers

use std::time::Duration;

use clap::Args;

use berth_synth::{SynthConfig, DEFAULT_MAX_PROBE_ATTEMPTS};

pub mod audit;
pub mod create;
pub mod harden;
pub mod keys;
pub mod lifecycle;

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Host probed when checking whether a port is taken
    #[arg(long, global = true, env = "BERTH_PROBE_HOST", default_value = "localhost")]
    pub probe_host: String,

    /// Ports tried per service before giving up
    #[arg(long, global = true, env = "BERTH_MAX_PROBE_ATTEMPTS", default_value_t = DEFAULT_MAX_PROBE_ATTEMPTS)]
    pub max_probe_attempts: u32,

    /// Connect timeout for a single port probe, in milliseconds
    #[arg(long, global = true, env = "BERTH_PROBE_TIMEOUT_MS", default_value_t = 250)]
    pub probe_timeout_ms: u64,
}

impl GlobalArgs {
    /// Engine configuration with these overrides applied to the defaults.
    #[must_use]
    pub fn synth_config(&self) -> SynthConfig {
        let mut config = SynthConfig::new();
        config.probe_host.clone_from(&self.probe_host);
        config.max_probe_attempts = self.max_probe_attempts.max(1);
        config.probe_timeout = Duration::from_millis(self.probe_timeout_ms);
        config
    }
}
