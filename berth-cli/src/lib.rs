//! berth command-line library
//!
//! Materializes self-hosted deployments: a project directory with fresh
//! credentials, role keys signed by a fresh secret, and free host ports for
//! every published service. Also rotates keys, hardens and audits existing
//! projects, and wraps `docker compose` for their lifecycle.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

pub mod audit;
pub mod commands;
pub mod compose;
pub mod error;
pub mod http;
pub mod project;
pub mod render;

pub use error::{CliError, Result};

use clap::{Parser, Subcommand};

use commands::GlobalArgs;

/// berth - synthesize and manage self-hosted deployments
#[derive(Parser, Debug)]
#[command(name = "berth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new project with fresh secrets and free ports
    Create(commands::create::CreateArgs),
    /// Generate a signing secret and role keys
    Keys(commands::keys::KeysArgs),
    /// Apply security defaults to a project
    Harden(commands::harden::HardenArgs),
    /// Check a project for insecure settings
    Audit(commands::audit::AuditArgs),
    /// Start a project's containers
    Start(commands::lifecycle::StartArgs),
    /// Stop a project's containers
    Stop(commands::lifecycle::StopArgs),
    /// Wipe a project's database
    Reset(commands::lifecycle::ResetArgs),
    /// Show container status
    Status(commands::lifecycle::StatusArgs),
    /// List projects in a directory
    List(commands::lifecycle::ListArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        let config = self.global.synth_config();
        match self.command {
            Commands::Create(args) => commands::create::run(args, &config).await,
            Commands::Keys(args) => commands::keys::run(args, &config).await,
            Commands::Harden(args) => commands::harden::run(args).await,
            Commands::Audit(args) => commands::audit::run(args, &config.probe_host).await,
            Commands::Start(args) => commands::lifecycle::start(args).await,
            Commands::Stop(args) => commands::lifecycle::stop(args).await,
            Commands::Reset(args) => commands::lifecycle::reset(args).await,
            Commands::Status(args) => commands::lifecycle::status(args).await,
            Commands::List(args) => commands::lifecycle::list(args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(e) => panic!("parse {args:?}: {e}"),
        }
    }

    #[test]
    fn create_accepts_base_port() {
        let cli = parse(&["berth", "create", "demo", "--base-port", "5000"]);
        match cli.command {
            Commands::Create(args) => {
                assert_eq!(args.dir, PathBuf::from("demo"));
                assert_eq!(args.base_port, Some(5000));
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn global_probe_options_apply_to_config() {
        let cli = parse(&[
            "berth",
            "create",
            "demo",
            "--probe-host",
            "127.0.0.1",
            "--max-probe-attempts",
            "16",
            "--probe-timeout-ms",
            "50",
        ]);
        let config = cli.global.synth_config();
        assert_eq!(config.probe_host, "127.0.0.1");
        assert_eq!(config.max_probe_attempts, 16);
        assert_eq!(config.probe_timeout, std::time::Duration::from_millis(50));
    }

    #[test]
    fn zero_probe_attempts_clamps_to_one() {
        let cli = parse(&["berth", "list", "--max-probe-attempts", "0"]);
        assert_eq!(cli.global.synth_config().max_probe_attempts, 1);
    }

    #[test]
    fn out_of_range_base_port_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["berth", "create", "demo", "--base-port", "70000"]).is_err());
    }

    #[test]
    fn keys_defaults() {
        let cli = parse(&["berth", "keys"]);
        match cli.command {
            Commands::Keys(args) => {
                assert!(args.env_file.is_none());
                assert_eq!(args.secret_length, 48);
                assert_eq!(args.expiry_years, 10);
            }
            other => panic!("expected keys, got {other:?}"),
        }
    }

    #[test]
    fn stop_keeps_volumes_only_when_asked() {
        let cli = parse(&["berth", "stop", "demo"]);
        assert!(matches!(cli.command, Commands::Stop(ref a) if !a.keep_volumes));
        let cli = parse(&["berth", "stop", "demo", "--keep-volumes"]);
        assert!(matches!(cli.command, Commands::Stop(ref a) if a.keep_volumes));
    }

    #[test]
    fn list_defaults_to_current_directory() {
        let cli = parse(&["berth", "list"]);
        assert!(matches!(cli.command, Commands::List(ref a) if a.dir == PathBuf::from(".")));
    }
}
