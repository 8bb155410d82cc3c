//! Audit command: report insecure settings in a project.

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;

use crate::audit::{audit_env, audit_live};
use crate::error::{CliError, Result};
use crate::project::Project;

/// Check a project for insecure settings; exits non-zero on findings
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Project directory
    pub dir: PathBuf,

    /// Also probe the running API gateway
    #[arg(long)]
    pub live: bool,
}

pub async fn run(args: AuditArgs, probe_host: &str) -> Result<()> {
    let project = Project::new(&args.dir)?;
    let env = project.read_env().await?;

    let mut findings = audit_env(&env, Utc::now());
    if args.live {
        findings.extend(audit_live(probe_host, &env).await);
    }

    if findings.is_empty() {
        println!("No issues found in '{}'.", project.name());
        return Ok(());
    }

    println!("Issues found in '{}':", project.name());
    for finding in &findings {
        println!("  - {finding}");
    }
    Err(CliError::AuditFailed { count: findings.len() })
}
