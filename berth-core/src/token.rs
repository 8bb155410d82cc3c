use std::fmt;

use serde::{Deserialize, Serialize};

/// A compact signed token: `header.payload.signature`, each segment
/// unpadded base64url.
///
/// Tokens are immutable. Rotation means minting a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Joins three already-encoded segments.
    #[must_use]
    pub fn from_segments(header: &str, payload: &str, signature: &str) -> Self {
        Self(format!("{header}.{payload}.{signature}"))
    }

    /// Wraps a token string read from elsewhere, without validation.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits into `(header, payload, signature)`.
    ///
    /// Returns `None` unless there are exactly three segments.
    #[must_use]
    pub fn segments(&self) -> Option<(&str, &str, &str)> {
        let mut parts = self.0.split('.');
        let header = parts.next()?;
        let payload = parts.next()?;
        let signature = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some((header, payload, signature))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}
