//! Harden command: custom dashboard credentials and safer auth defaults.

use std::path::PathBuf;

use chrono::Local;
use clap::Args;
use indexmap::IndexMap;

use crate::error::{CliError, Result};
use crate::project::{patch_env_file, Project};
use crate::render;

pub const MIN_USERNAME_LENGTH: usize = 4;
pub const MIN_PASSWORD_LENGTH: usize = 8;

const DEFAULT_DASHBOARD_USER: &str = "supabase";

/// Apply security defaults to an existing project
#[derive(Args, Debug)]
pub struct HardenArgs {
    /// Project directory
    pub dir: PathBuf,

    /// Dashboard username
    #[arg(long, default_value = DEFAULT_DASHBOARD_USER)]
    pub dashboard_user: String,

    /// Dashboard password (defaults to the project name)
    #[arg(long, env = "BERTH_DASHBOARD_PASSWORD", hide_env_values = true)]
    pub dashboard_password: Option<String>,
}

/// Validated dashboard credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardCredentials {
    pub username: String,
    pub password: String,
}

impl DashboardCredentials {
    /// # Errors
    /// Returns [`CliError::InvalidArgument`] if either value is too short or
    /// both equal the shipped default.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let password = password.into();
        if username.chars().count() < MIN_USERNAME_LENGTH {
            return Err(CliError::InvalidArgument(format!(
                "dashboard username must be at least {MIN_USERNAME_LENGTH} characters"
            )));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(CliError::InvalidArgument(format!(
                "dashboard password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        if username == DEFAULT_DASHBOARD_USER && password == DEFAULT_DASHBOARD_USER {
            return Err(CliError::InvalidArgument("dashboard credentials must not be the defaults".to_owned()));
        }
        Ok(Self { username, password })
    }

    /// Env assignments applied by the harden step.
    #[must_use]
    pub fn assignments(&self) -> IndexMap<String, String> {
        let mut fields = IndexMap::new();
        fields.insert("DASHBOARD_USERNAME".to_owned(), self.username.clone());
        fields.insert("DASHBOARD_PASSWORD".to_owned(), self.password.clone());
        fields.insert("ENABLE_EMAIL_AUTOCONFIRM".to_owned(), "true".to_owned());
        fields.insert("ENABLE_PHONE_SIGNUP".to_owned(), "false".to_owned());
        fields.insert("ENABLE_PHONE_AUTOCONFIRM".to_owned(), "false".to_owned());
        fields
    }
}

pub async fn run(args: HardenArgs) -> Result<()> {
    let project = Project::new(&args.dir)?;
    project.ensure_complete()?;

    let password = args.dashboard_password.unwrap_or_else(|| project.name().to_owned());
    let credentials = DashboardCredentials::new(args.dashboard_user, password)?;

    let env_path = project.env_path();
    let (backup, outcome) =
        patch_env_file(&env_path, &credentials.assignments(), Local::now().naive_local()).await?;
    tokio::fs::write(project.checklist_path(), render::security_checklist(project.name())).await?;

    tracing::info!(project = %project.name(), patched = outcome.patched.len(), "project hardened");

    println!("Backed up {} to {}", env_path.display(), backup.display());
    println!(
        "Dashboard credentials set: {} / {}",
        credentials.username,
        "*".repeat(credentials.password.chars().count())
    );
    for field in &outcome.missing {
        println!("  {field} not found in .env, left unset");
    }
    println!("Checklist written to {}", project.checklist_path().display());
    println!("Restart the stack for the changes to take effect.");
    Ok(())
}
