//! Create command: synthesize credentials and ports, then write a project.

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;

use berth_synth::{synthesize, PortAllocator, SecretGenerator, SynthConfig, TcpProber};

use crate::error::{CliError, Result};
use crate::project::Project;

/// Create a new project directory with fresh secrets and free ports
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Project directory to create; its name becomes the project name
    pub dir: PathBuf,

    /// Base port the service offsets are applied to (random when omitted)
    #[arg(long, env = "BERTH_BASE_PORT")]
    pub base_port: Option<u16>,
}

pub async fn run(args: CreateArgs, config: &SynthConfig) -> Result<()> {
    let project = Project::new(&args.dir)?;
    if project.root().exists() {
        return Err(CliError::precondition(project.root(), "already exists"));
    }

    let allocator = PortAllocator::with_max_attempts(
        TcpProber::from_config(config),
        config.topology.clone(),
        config.max_probe_attempts,
    );
    let mut secrets = SecretGenerator::from_entropy();
    let synthesis = synthesize(config, args.base_port, &allocator, &mut secrets, Utc::now()).await?;

    project.materialize(&synthesis).await?;

    println!("Created project '{}' at {}", project.name(), project.root().display());
    println!();
    for (service, port) in synthesis.ports.iter() {
        println!("  {:<22} {port}", service.label());
    }
    println!();
    println!("Next steps:");
    println!("  berth harden {}", project.root().display());
    println!("  berth start {}", project.root().display());
    Ok(())
}
