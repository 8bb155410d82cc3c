//! Idempotent `KEY=value` field patching for dotenv-style text.
//!
//! Only the value of the first line beginning with `KEY=` changes. Every
//! other byte, including comments, blank lines, ordering, and line endings,
//! is carried over unchanged.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use indexmap::IndexMap;

use crate::SynthError;

/// Result of a patch: the new text plus which fields were found.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Patched {
    /// The rewritten text.
    pub text: String,
    /// Fields whose line was rewritten, in assignment order.
    pub patched: Vec<String>,
    /// Fields with no matching line. They are not appended.
    pub missing: Vec<String>,
}

/// Rewrites named fields in a configuration document.
pub trait FieldPatcher {
    /// Apply `assignments` to `text`.
    ///
    /// # Errors
    /// Returns [`SynthError::InvalidField`] if an assignment cannot be
    /// represented in the document format.
    fn patch(&self, text: &str, assignments: &IndexMap<String, String>) -> Result<Patched, SynthError>;
}

/// Line-oriented patcher for `KEY=value` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvLinePatcher;

impl FieldPatcher for EnvLinePatcher {
    fn patch(&self, text: &str, assignments: &IndexMap<String, String>) -> Result<Patched, SynthError> {
        for (field, value) in assignments {
            validate(field, value)?;
        }

        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let mut out: Vec<Cow<'_, str>> = lines.iter().map(|line| Cow::Borrowed(*line)).collect();
        let mut patched = Vec::new();
        let mut missing = Vec::new();

        for (field, value) in assignments {
            let prefix = format!("{field}=");
            match lines.iter().position(|line| line.starts_with(&prefix)) {
                Some(index) => {
                    let ending = line_ending(lines[index]);
                    out[index] = Cow::Owned(format!("{prefix}{value}{ending}"));
                    patched.push(field.clone());
                }
                None => {
                    tracing::warn!(field = %field, "field not present, leaving unpatched");
                    missing.push(field.clone());
                }
            }
        }

        Ok(Patched { text: out.concat(), patched, missing })
    }
}

/// Patch `text` with the default line-oriented patcher.
///
/// # Errors
/// Returns [`SynthError::InvalidField`] if a field name is empty or contains
/// `=` or whitespace, or if a value contains a line break.
pub fn patch_fields(text: &str, assignments: &IndexMap<String, String>) -> Result<Patched, SynthError> {
    EnvLinePatcher.patch(text, assignments)
}

/// Path of the snapshot taken before overwriting `path`:
/// `<path>.bak.<YYYYmmddHHMMSS>`.
#[must_use]
pub fn backup_path(path: &Path, now: NaiveDateTime) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".bak.{}", now.format("%Y%m%d%H%M%S")));
    PathBuf::from(name)
}

fn validate(field: &str, value: &str) -> Result<(), SynthError> {
    let invalid = |reason: &str| SynthError::InvalidField {
        field: field.to_owned(),
        reason: reason.to_owned(),
    };
    if field.is_empty() {
        return Err(invalid("field name is empty"));
    }
    if field.contains('=') {
        return Err(invalid("field name contains '='"));
    }
    if field.chars().any(char::is_whitespace) {
        return Err(invalid("field name contains whitespace"));
    }
    if value.contains(['\n', '\r']) {
        return Err(invalid("value contains a line break"));
    }
    Ok(())
}

fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}
