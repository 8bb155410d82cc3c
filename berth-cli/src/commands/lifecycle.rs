//! Start, stop, reset, status and list: wrappers over `docker compose`.

use std::path::PathBuf;

use clap::Args;

use berth_core::Service;

use crate::compose::Compose;
use crate::error::{CliError, Result};
use crate::project::{env_value, list_projects, Project};

/// Start a project's containers
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Project directory
    pub dir: PathBuf,

    /// Stream docker compose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Stop a project's containers
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Project directory
    pub dir: PathBuf,

    /// Keep named volumes instead of removing them
    #[arg(long)]
    pub keep_volumes: bool,
}

/// Wipe a project's database and volumes
#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Project directory
    pub dir: PathBuf,
}

/// Show container status for a project
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Project directory
    pub dir: PathBuf,
}

/// List projects under a directory
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Directory to scan
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

pub async fn start(args: StartArgs) -> Result<()> {
    let project = Project::new(&args.dir)?;
    project.ensure_complete()?;

    Compose::new(project.root()).verbose(args.verbose).up().await?;

    let env = project.read_env().await?;
    let port = |service: Service| env_value(&env, service.env_key()).unwrap_or("?");
    println!("Project '{}' started.", project.name());
    println!("  Studio:   http://localhost:{}", port(Service::Studio));
    println!("  API:      http://localhost:{}", port(Service::GatewayHttp));
    println!("  Postgres: localhost:{}", port(Service::Database));
    Ok(())
}

pub async fn stop(args: StopArgs) -> Result<()> {
    let project = Project::new(&args.dir)?;
    project.ensure_complete()?;
    Compose::new(project.root()).down(args.keep_volumes).await?;
    println!("Project '{}' stopped.", project.name());
    Ok(())
}

pub async fn reset(args: ResetArgs) -> Result<()> {
    let project = Project::new(&args.dir)?;
    project.ensure_complete()?;

    let script = project.reset_script_path();
    if script.is_file() {
        let status = tokio::process::Command::new("sh")
            .arg(&script)
            .current_dir(project.root())
            .status()
            .await
            .map_err(|e| CliError::Compose(format!("failed to run {}: {e}", script.display())))?;
        if !status.success() {
            return Err(CliError::Compose(format!("{} exited with {status}", script.display())));
        }
    } else {
        Compose::new(project.root()).down(false).await?;
        let data = project.db_data_path();
        if data.exists() {
            tokio::fs::remove_dir_all(&data).await?;
        }
        tokio::fs::create_dir_all(&data).await?;
    }

    tracing::info!(project = %project.name(), "project reset");
    println!("Project '{}' reset. Start it again with: berth start {}", project.name(), project.root().display());
    Ok(())
}

pub async fn status(args: StatusArgs) -> Result<()> {
    let project = Project::new(&args.dir)?;
    project.ensure_complete()?;

    let rows = Compose::new(project.root()).ps().await?;
    if rows.is_empty() {
        println!("Project '{}' has no containers.", project.name());
        return Ok(());
    }

    let prefix = format!("{}-", project.name());
    println!("{:<20} {:<10} {:<10} PORTS", "SERVICE", "STATE", "HEALTH");
    for row in &rows {
        let name = row.name.strip_prefix(&prefix).unwrap_or(&row.name);
        let health = if row.health.is_empty() { "-" } else { row.health.as_str() };
        println!("{name:<20} {:<10} {health:<10} {}", row.state, row.ports);
    }
    Ok(())
}

pub async fn list(args: ListArgs) -> Result<()> {
    let projects = list_projects(&args.dir).await?;
    if projects.is_empty() {
        println!("No projects found in {}.", args.dir.display());
        return Ok(());
    }

    for project in &projects {
        let state = match Compose::new(project.root()).running_services().await {
            Ok(services) if services.is_empty() => "stopped".to_owned(),
            Ok(services) => format!("running ({} services)", services.len()),
            Err(e) => {
                tracing::debug!(project = %project.name(), error = %e, "could not query compose");
                "unknown".to_owned()
            }
        };
        println!("{:<24} {state}", project.name());
    }
    Ok(())
}
