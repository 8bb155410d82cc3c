use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Privilege class a minted token grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Role {
    /// Low-privilege key handed to browsers and public clients.
    Anon,
    /// Elevated key that bypasses row-level security.
    ServiceRole,
}

impl Role {
    /// The literal written into the `role` claim.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Anon => "anon",
            Role::ServiceRole => "service_role",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed content of a token.
///
/// Serializes as a flat JSON object: the four registered fields plus any
/// `extra` entries. Deserialization applies the same checks as
/// [`Claims::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawClaims")]
#[non_exhaustive]
pub struct Claims {
    /// Privilege class, e.g. `"anon"`.
    pub role: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch. Always greater than `iat`.
    pub exp: i64,
    /// Additional caller-defined claims.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct RawClaims {
    role: String,
    iss: String,
    iat: i64,
    exp: i64,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<RawClaims> for Claims {
    type Error = CoreError;

    fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
        let mut claims = Claims::new(raw.role, raw.iss, raw.iat, raw.exp)?;
        claims.extra = raw.extra;
        Ok(claims)
    }
}

impl Claims {
    /// Creates a claims payload.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidClaims`] if `exp <= iat`.
    pub fn new(
        role: impl Into<String>,
        iss: impl Into<String>,
        iat: i64,
        exp: i64,
    ) -> Result<Self, CoreError> {
        if exp <= iat {
            return Err(CoreError::InvalidClaims { iat, exp });
        }
        Ok(Self {
            role: role.into(),
            iss: iss.into(),
            iat,
            exp,
            extra: BTreeMap::new(),
        })
    }

    /// Claims for `role` issued at `issued_at` and valid for `validity`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidClaims`] if `validity` is not positive.
    pub fn for_role(
        role: Role,
        issuer: impl Into<String>,
        issued_at: DateTime<Utc>,
        validity: Duration,
    ) -> Result<Self, CoreError> {
        let iat = issued_at.timestamp();
        let exp = iat.saturating_add(validity.num_seconds());
        Self::new(role.as_str(), issuer, iat, exp)
    }

    /// Adds an extra claim, replacing any previous value under `key`.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Returns `true` if the claims have expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
