//! Thin wrapper over `docker compose` for a single project directory.

use std::path::PathBuf;
use std::process::{Output, Stdio};

use serde::Deserialize;
use tokio::process::Command;

use crate::error::{CliError, Result};

/// One row of `docker compose ps --format json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerStatus {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Service", default)]
    pub service: String,
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Health", default)]
    pub health: String,
    #[serde(rename = "Ports", default)]
    pub ports: String,
}

/// Runs compose commands with the project directory as working directory.
#[derive(Debug, Clone)]
pub struct Compose {
    project_dir: PathBuf,
    verbose: bool,
}

impl Compose {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self { project_dir: project_dir.into(), verbose: false }
    }

    /// Stream compose output to the terminal instead of capturing it.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// `docker compose up -d`.
    ///
    /// # Errors
    /// Returns [`CliError::Compose`] if compose cannot be spawned or fails.
    pub async fn up(&self) -> Result<()> {
        self.run(&["up", "-d"]).await.map(drop)
    }

    /// `docker compose down`, removing volumes unless `keep_volumes` is set.
    ///
    /// # Errors
    /// Returns [`CliError::Compose`] if compose cannot be spawned or fails.
    pub async fn down(&self, keep_volumes: bool) -> Result<()> {
        let mut args = vec!["down", "--remove-orphans"];
        if !keep_volumes {
            args.push("-v");
        }
        self.run(&args).await.map(drop)
    }

    /// Container rows for this project.
    ///
    /// # Errors
    /// Returns [`CliError::Compose`] if compose cannot be spawned or fails.
    pub async fn ps(&self) -> Result<Vec<ContainerStatus>> {
        let output = self.capture(&["ps", "--all", "--format", "json"]).await?;
        Ok(parse_ps_output(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Names of services currently running.
    ///
    /// # Errors
    /// Returns [`CliError::Compose`] if compose cannot be spawned or fails.
    pub async fn running_services(&self) -> Result<Vec<String>> {
        let output = self.capture(&["ps", "--services", "--filter", "status=running"]).await?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect())
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        if !self.verbose {
            return self.capture(args).await;
        }
        let status = self
            .command(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| CliError::Compose(format!("failed to spawn docker: {e}")))?;
        if !status.success() {
            return Err(CliError::Compose(format!("`docker compose {}` exited with {status}", args.join(" "))));
        }
        Ok(Output { status, stdout: Vec::new(), stderr: Vec::new() })
    }

    async fn capture(&self, args: &[&str]) -> Result<Output> {
        let output = self
            .command(args)
            .output()
            .await
            .map_err(|e| CliError::Compose(format!("failed to spawn docker: {e}")))?;
        if !output.status.success() {
            return Err(CliError::Compose(format!(
                "`docker compose {}` exited with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output)
    }

    fn command(&self, args: &[&str]) -> Command {
        tracing::debug!(dir = %self.project_dir.display(), args = ?args, "running docker compose");
        let mut cmd = Command::new("docker");
        cmd.arg("compose").args(args).current_dir(&self.project_dir).kill_on_drop(true);
        cmd
    }
}

/// Parse `docker compose ps --format json` output.
///
/// Older compose releases print one JSON array, newer ones one object per
/// line. Lines that fail to parse are logged and skipped.
#[must_use]
pub fn parse_ps_output(stdout: &str) -> Vec<ContainerStatus> {
    let trimmed = stdout.trim();
    if trimmed.starts_with('[') {
        return match serde_json::from_str(trimmed) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "unparsable compose ps output");
                Vec::new()
            }
        };
    }

    trimmed
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|line| match serde_json::from_str::<ContainerStatus>(line) {
            Ok(row) => Some(row),
            Err(e) => {
                tracing::warn!(error = %e, line = %line, "skipping unparsable compose ps line");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_line_delimited_rows() {
        let out = r#"{"Name":"demo-db","Service":"db","State":"running","Health":"healthy","Ports":"5432/tcp"}
{"Name":"demo-kong","Service":"kong","State":"running","Health":"","Ports":"0.0.0.0:5000->8000/tcp"}
"#;
        let rows = parse_ps_output(out);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "demo-db");
        assert_eq!(rows[0].health, "healthy");
        assert_eq!(rows[1].ports, "0.0.0.0:5000->8000/tcp");
    }

    #[test]
    fn parses_array_output() {
        let out = r#"[{"Name":"demo-db","State":"exited"}]"#;
        let rows = parse_ps_output(out);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].state, "exited");
        assert_eq!(rows[0].health, "", "absent fields default to empty");
    }

    #[test]
    fn skips_malformed_lines() {
        let out = "not json\n{\"Name\":\"demo-studio\",\"State\":\"running\"}\n{\"Name\":";
        let rows = parse_ps_output(out);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "demo-studio");
    }

    #[test]
    fn empty_output_yields_no_rows() {
        assert!(parse_ps_output("").is_empty());
        assert!(parse_ps_output("\n\n").is_empty());
    }
}
