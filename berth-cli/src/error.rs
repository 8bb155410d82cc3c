//! Error types for the command-line layer.

use std::path::PathBuf;

use berth_core::CoreError;
use berth_synth::SynthError;

/// Errors surfaced by `berth` subcommands.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CliError {
    /// A path was missing where required, or present where a fresh create
    /// was requested.
    #[error("{}: {reason}", .path.display())]
    Precondition { path: PathBuf, reason: String },

    /// A flag or argument value was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An error propagated from the synthesis engine.
    #[error(transparent)]
    Synth(#[from] SynthError),

    /// A domain invariant was violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// `docker compose` could not be run or exited unsuccessfully.
    #[error("docker compose failed: {0}")]
    Compose(String),

    /// The live HTTP probe could not complete.
    #[error("HTTP probe failed: {0}")]
    Http(String),

    /// The security audit reported findings.
    #[error("audit reported {count} finding(s)")]
    AuditFailed { count: usize },

    /// Underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Build a [`CliError::Precondition`] for `path`.
    pub fn precondition(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Precondition { path: path.into(), reason: reason.into() }
    }

    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Precondition { .. } | CliError::InvalidArgument(_) => 2,
            CliError::AuditFailed { .. } => 3,
            CliError::Synth(SynthError::PortExhausted { .. }) => 4,
            _ => 1,
        }
    }
}

/// Result alias for command handlers.
pub type Result<T, E = CliError> = std::result::Result<T, E>;
