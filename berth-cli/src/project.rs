//! Project directories: layout, materialization, and `.env` access.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use indexmap::IndexMap;

use berth_synth::{backup_path, patch_fields, Patched, Synthesis};

use crate::error::{CliError, Result};
use crate::render;

const ENV_FILE: &str = ".env";
const COMPOSE_FILE: &str = "docker-compose.yml";
const README_FILE: &str = "README.md";
const RESET_SCRIPT: &str = "reset.sh";
const CHECKLIST_FILE: &str = "security_checklist.md";

/// A project directory on disk.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    name: String,
}

impl Project {
    /// Describe the project rooted at `root`. The project name is the last
    /// path component.
    ///
    /// # Errors
    /// Returns [`CliError::InvalidArgument`] when `root` has no usable final
    /// component (for example `/` or `..`).
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                CliError::InvalidArgument(format!("cannot derive a project name from {}", root.display()))
            })?
            .to_owned();
        Ok(Self { root, name })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn env_path(&self) -> PathBuf {
        self.root.join(ENV_FILE)
    }

    #[must_use]
    pub fn compose_path(&self) -> PathBuf {
        self.root.join(COMPOSE_FILE)
    }

    #[must_use]
    pub fn reset_script_path(&self) -> PathBuf {
        self.root.join(RESET_SCRIPT)
    }

    #[must_use]
    pub fn checklist_path(&self) -> PathBuf {
        self.root.join(CHECKLIST_FILE)
    }

    #[must_use]
    pub fn db_data_path(&self) -> PathBuf {
        self.root.join("volumes").join("db").join("data")
    }

    /// `true` when the directory has the compose file, the `.env` file, and
    /// the volumes directory.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.compose_path().is_file() && self.env_path().is_file() && self.root.join("volumes").is_dir()
    }

    /// Fail unless the project directory exists and looks like a project.
    ///
    /// # Errors
    /// Returns [`CliError::Precondition`] naming the first missing piece.
    pub fn ensure_complete(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(CliError::precondition(&self.root, "project directory does not exist"));
        }
        for path in [self.compose_path(), self.env_path()] {
            if !path.is_file() {
                return Err(CliError::precondition(path, "required file is missing"));
            }
        }
        let volumes = self.root.join("volumes");
        if !volumes.is_dir() {
            return Err(CliError::precondition(volumes, "required directory is missing"));
        }
        Ok(())
    }

    /// Write every artifact for a fresh project. The directory must not exist;
    /// if any write fails the partially written directory is removed.
    ///
    /// # Errors
    /// Returns [`CliError::Precondition`] if the directory already exists, or
    /// the underlying I/O error.
    pub async fn materialize(&self, synthesis: &Synthesis) -> Result<()> {
        self.create_root().await?;

        if let Err(e) = self.write_artifacts(synthesis).await {
            if let Err(cleanup) = tokio::fs::remove_dir_all(&self.root).await {
                tracing::warn!(path = %self.root.display(), error = %cleanup, "failed to remove partial project");
            }
            return Err(e);
        }

        tracing::info!(project = %self.name, path = %self.root.display(), "project materialized");
        Ok(())
    }

    /// Create the project directory itself; only its parents may pre-exist.
    async fn create_root(&self) -> Result<()> {
        if let Some(parent) = self.root.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        match tokio::fs::create_dir(&self.root).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(CliError::precondition(&self.root, "already exists"))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_artifacts(&self, synthesis: &Synthesis) -> Result<()> {
        tokio::fs::create_dir_all(self.db_data_path()).await?;
        tokio::fs::write(self.env_path(), render::env_file(&self.name, synthesis)).await?;
        tokio::fs::write(self.compose_path(), render::compose_file(&self.name)).await?;
        tokio::fs::write(self.root.join(README_FILE), render::readme(&self.name, synthesis)).await?;
        tokio::fs::write(self.reset_script_path(), render::reset_script()).await?;
        make_executable(&self.reset_script_path()).await?;
        Ok(())
    }

    /// Read the project's `.env` file.
    ///
    /// # Errors
    /// Returns [`CliError::Precondition`] if it is missing.
    pub async fn read_env(&self) -> Result<String> {
        read_env_file(&self.env_path()).await
    }
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Read an env file, mapping a missing file to a precondition failure.
///
/// # Errors
/// Returns [`CliError::Precondition`] if `path` is not a file, or the
/// underlying I/O error.
pub async fn read_env_file(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(CliError::precondition(path, "env file not found"));
    }
    Ok(tokio::fs::read_to_string(path).await?)
}

/// Value of the first `KEY=` line in `text`, mirroring which line the patcher
/// rewrites.
#[must_use]
pub fn env_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines().find_map(|line| {
        line.strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .map(|v| v.trim_end_matches('\r'))
    })
}

/// Patch `path` in place after snapshotting it to a timestamped backup.
///
/// Returns the backup path and the patch outcome. Fields with no matching
/// line are reported in [`Patched::missing`] and left out of the file.
///
/// # Errors
/// Returns [`CliError::Precondition`] if `path` is missing, a synthesis error
/// for invalid fields, or the underlying I/O error. An invalid field is
/// rejected before the backup is written.
pub async fn patch_env_file(
    path: &Path,
    assignments: &IndexMap<String, String>,
    now: NaiveDateTime,
) -> Result<(PathBuf, Patched)> {
    let original = read_env_file(path).await?;
    let outcome = patch_fields(&original, assignments)?;

    let backup = backup_path(path, now);
    tokio::fs::write(&backup, &original).await?;
    tokio::fs::write(path, &outcome.text).await?;

    tracing::info!(
        path = %path.display(),
        backup = %backup.display(),
        patched = outcome.patched.len(),
        missing = outcome.missing.len(),
        "env file patched"
    );
    Ok((backup, outcome))
}

/// Subdirectories of `dir` that look like complete projects, sorted by name.
///
/// # Errors
/// Returns the I/O error if `dir` cannot be read.
pub async fn list_projects(dir: &Path) -> Result<Vec<Project>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut projects = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        if let Ok(project) = Project::new(entry.path()) {
            if project.is_complete() {
                projects.push(project);
            }
        }
    }
    projects.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::sample_synthesis;

    fn now() -> NaiveDateTime {
        match chrono::NaiveDate::from_ymd_opt(2024, 3, 5).and_then(|d| d.and_hms_opt(14, 7, 9)) {
            Some(t) => t,
            None => panic!("valid timestamp"),
        }
    }

    fn tempdir() -> tempfile::TempDir {
        match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => panic!("tempdir: {e}"),
        }
    }

    #[test]
    fn project_name_is_last_component() {
        let project = match Project::new("/srv/projects/demo") {
            Ok(p) => p,
            Err(e) => panic!("valid root: {e}"),
        };
        assert_eq!(project.name(), "demo");
        assert_eq!(project.env_path(), PathBuf::from("/srv/projects/demo/.env"));
    }

    #[test]
    fn project_without_name_is_rejected() {
        assert!(matches!(Project::new("/"), Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn env_value_reads_first_exact_key() {
        let text = "JWT_SECRET_OLD=a\nJWT_SECRET=b\r\nJWT_SECRET=c\n";
        assert_eq!(env_value(text, "JWT_SECRET"), Some("b"));
        assert_eq!(env_value(text, "ANON_KEY"), None);
    }

    #[tokio::test]
    async fn materialize_creates_missing_parents() {
        let dir = tempdir();
        let project = match Project::new(dir.path().join("nested/projects/demo")) {
            Ok(p) => p,
            Err(e) => panic!("valid root: {e}"),
        };
        if let Err(e) = project.materialize(&sample_synthesis()).await {
            panic!("materialize: {e}");
        }
        assert!(project.is_complete());
    }

    #[tokio::test]
    async fn materialize_leaves_an_existing_directory_untouched() {
        let dir = tempdir();
        let root = dir.path().join("demo");
        let keep = root.join("keep.txt");
        if let Err(e) = tokio::fs::create_dir(&root).await {
            panic!("mkdir: {e}");
        }
        if let Err(e) = tokio::fs::write(&keep, "mine").await {
            panic!("write: {e}");
        }
        let project = match Project::new(&root) {
            Ok(p) => p,
            Err(e) => panic!("valid root: {e}"),
        };

        let result = project.materialize(&sample_synthesis()).await;
        assert!(matches!(result, Err(CliError::Precondition { .. })), "got {result:?}");
        assert_eq!(tokio::fs::read_to_string(&keep).await.unwrap_or_default(), "mine");
        assert!(!project.env_path().exists());
    }

    #[tokio::test]
    async fn patch_env_file_backs_up_before_writing() {
        let dir = tempdir();
        let path = dir.path().join(".env");
        let original = "# secrets\nJWT_SECRET=old\nANON_KEY=old\n";
        if let Err(e) = tokio::fs::write(&path, original).await {
            panic!("write: {e}");
        }

        let mut fields = IndexMap::new();
        fields.insert("JWT_SECRET".to_owned(), "new".to_owned());
        fields.insert("SERVICE_ROLE_KEY".to_owned(), "x".to_owned());

        let (backup, outcome) = match patch_env_file(&path, &fields, now()).await {
            Ok(r) => r,
            Err(e) => panic!("patch: {e}"),
        };

        assert_eq!(backup, dir.path().join(".env.bak.20240305140709"));
        assert_eq!(outcome.missing, vec!["SERVICE_ROLE_KEY".to_owned()]);
        let backed_up = tokio::fs::read_to_string(&backup).await.unwrap_or_default();
        assert_eq!(backed_up, original, "backup must hold the pre-patch content");
        let patched = tokio::fs::read_to_string(&path).await.unwrap_or_default();
        assert_eq!(patched, "# secrets\nJWT_SECRET=new\nANON_KEY=old\n");
    }

    #[tokio::test]
    async fn patch_env_file_rejects_invalid_field_without_backup() {
        let dir = tempdir();
        let path = dir.path().join(".env");
        if let Err(e) = tokio::fs::write(&path, "A=1\n").await {
            panic!("write: {e}");
        }
        let mut fields = IndexMap::new();
        fields.insert("BAD KEY".to_owned(), "x".to_owned());

        let result = patch_env_file(&path, &fields, now()).await;
        assert!(matches!(result, Err(CliError::Synth(_))));
        assert!(!dir.path().join(".env.bak.20240305140709").exists());
    }

    #[tokio::test]
    async fn patch_env_file_missing_file_is_precondition() {
        let dir = tempdir();
        let result = patch_env_file(&dir.path().join(".env"), &IndexMap::new(), now()).await;
        assert!(matches!(result, Err(CliError::Precondition { .. })));
    }

    #[tokio::test]
    async fn ensure_complete_names_missing_piece() {
        let dir = tempdir();
        let project = match Project::new(dir.path().join("demo")) {
            Ok(p) => p,
            Err(e) => panic!("project: {e}"),
        };
        assert!(matches!(project.ensure_complete(), Err(CliError::Precondition { .. })));

        if let Err(e) = tokio::fs::create_dir_all(project.root()).await {
            panic!("mkdir: {e}");
        }
        match project.ensure_complete() {
            Err(CliError::Precondition { path, .. }) => assert_eq!(path, project.compose_path()),
            other => panic!("expected missing compose file, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_projects_skips_incomplete_directories() {
        let dir = tempdir();
        for name in ["beta", "alpha"] {
            let root = dir.path().join(name);
            let _ = tokio::fs::create_dir_all(root.join("volumes")).await;
            let _ = tokio::fs::write(root.join(".env"), "A=1\n").await;
            let _ = tokio::fs::write(root.join("docker-compose.yml"), "name: x\n").await;
        }
        let _ = tokio::fs::create_dir_all(dir.path().join("scratch")).await;

        let projects = match list_projects(dir.path()).await {
            Ok(p) => p,
            Err(e) => panic!("list: {e}"),
        };
        let names: Vec<&str> = projects.iter().map(Project::name).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    proptest::proptest! {
        #[test]
        fn env_value_reads_what_patch_wrote(value in "[^\r\n]{0,40}") {
            let text = "# header\nJWT_SECRET=old\nANON_KEY=a\n";
            let mut fields = IndexMap::new();
            fields.insert("JWT_SECRET".to_owned(), value.clone());
            let patched = match patch_fields(text, &fields) {
                Ok(p) => p,
                Err(e) => panic!("patch: {e}"),
            };
            proptest::prop_assert_eq!(env_value(&patched.text, "JWT_SECRET"), Some(value.as_str()));
            proptest::prop_assert_eq!(env_value(&patched.text, "ANON_KEY"), Some("a"));
        }
    }
}
