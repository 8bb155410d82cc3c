//! Token minting and verification (HS256 over canonical JSON).
//!
//! `T = b64(header) "." b64(payload) "." b64(HMAC-SHA256(secret, b64(header) "." b64(payload)))`
//!
//! where `b64` is unpadded base64url and both JSON documents are canonical:
//! object keys sorted at every depth, no insignificant whitespace.

use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

use berth_core::{Claims, Role, Secret, Token};

use crate::{SynthError, TokenPolicy};

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm written into every header.
pub const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header<'a> {
    alg: &'a str,
    typ: &'a str,
}

const HEADER: Header<'static> = Header { alg: ALGORITHM, typ: "JWT" };

/// Mint a signed token over `claims`.
///
/// Minting adds no randomness: the same claims and secret always produce
/// the same token.
///
/// # Errors
/// Returns [`SynthError::InvalidKey`] if `secret` is empty, or
/// [`SynthError::Encoding`] if the claims cannot be written as JSON.
pub fn mint(claims: &Claims, secret: &Secret) -> Result<Token, SynthError> {
    if secret.is_empty() {
        return Err(SynthError::InvalidKey);
    }

    let header_b64 = URL_SAFE_NO_PAD.encode(canonical_json(&HEADER)?);
    let payload_b64 = URL_SAFE_NO_PAD.encode(canonical_json(claims)?);
    let signature = sign(secret, &header_b64, &payload_b64)?;

    Ok(Token::from_segments(
        &header_b64,
        &payload_b64,
        &URL_SAFE_NO_PAD.encode(signature),
    ))
}

/// Mint a role token issued at `now` under `policy`.
///
/// # Errors
/// Returns [`SynthError::Core`] if the policy's validity is not positive,
/// or any error from [`mint`].
pub fn mint_role_token(
    role: Role,
    secret: &Secret,
    policy: &TokenPolicy,
    now: DateTime<Utc>,
) -> Result<Token, SynthError> {
    let claims = Claims::for_role(role, policy.issuer.as_str(), now, policy.validity())?;
    let token = mint(&claims, secret)?;
    tracing::debug!(role = %role, iat = claims.iat, exp = claims.exp, "minted role token");
    Ok(token)
}

/// Returns `true` if `token` carries a valid HS256 signature under `secret`.
///
/// The comparison is constant-time. Expiry is not checked here.
#[must_use]
pub fn verify(token: &str, secret: &Secret) -> bool {
    if secret.is_empty() {
        return false;
    }
    let token = Token::new(token);
    let Some((header_b64, payload_b64, signature_b64)) = token.segments() else {
        return false;
    };
    if !header_is_hs256(header_b64) {
        return false;
    }
    let Ok(signature) = URL_SAFE_NO_PAD.decode(signature_b64) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature).is_ok()
}

/// Decode the claims segment without checking the signature.
///
/// # Errors
/// Returns [`SynthError::MalformedToken`] if the token does not have three
/// segments, the payload is not base64url, or it is not a claims object
/// with `role`, `iss`, `iat` and `exp` where `exp > iat`.
pub fn decode_claims(token: &str) -> Result<Claims, SynthError> {
    let token = Token::new(token);
    let (_, payload_b64, _) = token.segments().ok_or_else(|| SynthError::MalformedToken {
        reason: "expected three dot-separated segments".to_owned(),
    })?;
    let bytes = URL_SAFE_NO_PAD.decode(payload_b64).map_err(|e| SynthError::MalformedToken {
        reason: format!("payload is not base64url: {e}"),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| SynthError::MalformedToken {
        reason: format!("payload is not a claims object: {e}"),
    })
}

/// Serialize `value` as canonical compact JSON.
///
/// # Errors
/// Returns [`SynthError::Encoding`] if `value` cannot be represented as JSON.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SynthError> {
    let value = serde_json::to_value(value).map_err(|e| SynthError::Encoding(e.to_string()))?;
    serde_json::to_vec(&canonicalize(value)).map_err(|e| SynthError::Encoding(e.to_string()))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

fn sign(secret: &Secret, header_b64: &str, payload_b64: &str) -> Result<Vec<u8>, SynthError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SynthError::InvalidKey)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn header_is_hs256(header_b64: &str) -> bool {
    URL_SAFE_NO_PAD
        .decode(header_b64)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Header<'_>>(&bytes).ok().map(|h| h.alg == ALGORITHM))
        .unwrap_or(false)
}
