//! berth
//!
//! Synthesizes credentials and free ports for a self-hosted deployment.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use berth_cli::Cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        tracing::error!(error = %e, "berth failed");
        std::process::exit(e.exit_code());
    }
}
