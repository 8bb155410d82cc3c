//! Security audit of a project's `.env` and, optionally, its running gateway.

use std::fmt;

use chrono::{DateTime, Utc};
use hyper::Method;

use berth_core::{Role, Secret, Service};
use berth_synth::{decode_claims, verify};

use crate::http;
use crate::project::env_value;

/// Shortest signing secret the audit accepts.
pub const MIN_SIGNING_SECRET_LENGTH: usize = 32;

/// Issuer carried by the publicly distributed demo keys.
pub const DEMO_ISSUER: &str = "supabase-demo";

const DEFAULT_DASHBOARD_CREDENTIAL: &str = "supabase";
const CORS_PROBE_ORIGIN: &str = "http://example.com";

/// One audit finding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Finding {
    MissingField { field: &'static str },
    DefaultDashboardCredentials,
    WeakSigningSecret { length: usize },
    DemoKey { field: &'static str },
    BadSignature { field: &'static str },
    WrongRole { field: &'static str, expected: Role, found: String },
    ExpiredKey { field: &'static str },
    PhoneSignupEnabled,
    GatewayUnreachable { port: u16, reason: String },
    CorsNotConfigured { port: u16 },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::MissingField { field } => write!(f, "{field} is not set"),
            Finding::DefaultDashboardCredentials => f.write_str("dashboard still uses the default credentials"),
            Finding::WeakSigningSecret { length } => write!(
                f,
                "JWT_SECRET is {length} characters, expected at least {MIN_SIGNING_SECRET_LENGTH}"
            ),
            Finding::DemoKey { field } => write!(f, "{field} is a public demo key"),
            Finding::BadSignature { field } => write!(f, "{field} is not signed by JWT_SECRET"),
            Finding::WrongRole { field, expected, found } => {
                write!(f, "{field} carries role '{found}', expected '{expected}'")
            }
            Finding::ExpiredKey { field } => write!(f, "{field} has expired"),
            Finding::PhoneSignupEnabled => f.write_str("phone signup is enabled without an SMS provider check"),
            Finding::GatewayUnreachable { port, reason } => write!(f, "API gateway on port {port} unreachable: {reason}"),
            Finding::CorsNotConfigured { port } => {
                write!(f, "API gateway on port {port} returned no Access-Control-Allow-Origin header")
            }
        }
    }
}

/// Audit the text of an `.env` file. An empty result means no findings.
#[must_use]
pub fn audit_env(text: &str, now: DateTime<Utc>) -> Vec<Finding> {
    let mut findings = Vec::new();

    let username = env_value(text, "DASHBOARD_USERNAME");
    let password = env_value(text, "DASHBOARD_PASSWORD");
    if username == Some(DEFAULT_DASHBOARD_CREDENTIAL) && password == Some(DEFAULT_DASHBOARD_CREDENTIAL) {
        findings.push(Finding::DefaultDashboardCredentials);
    }

    if env_value(text, "ENABLE_PHONE_SIGNUP") == Some("true") {
        findings.push(Finding::PhoneSignupEnabled);
    }

    let secret = match env_value(text, "JWT_SECRET").filter(|s| !s.is_empty()) {
        Some(s) => {
            if s.len() < MIN_SIGNING_SECRET_LENGTH {
                findings.push(Finding::WeakSigningSecret { length: s.len() });
            }
            Some(Secret::new(s))
        }
        None => {
            findings.push(Finding::MissingField { field: "JWT_SECRET" });
            None
        }
    };

    for (field, expected) in [("ANON_KEY", Role::Anon), ("SERVICE_ROLE_KEY", Role::ServiceRole)] {
        let Some(token) = env_value(text, field).filter(|t| !t.is_empty()) else {
            findings.push(Finding::MissingField { field });
            continue;
        };
        audit_key(field, token, expected, secret.as_ref(), now, &mut findings);
    }

    findings
}

fn audit_key(
    field: &'static str,
    token: &str,
    expected: Role,
    secret: Option<&Secret>,
    now: DateTime<Utc>,
    findings: &mut Vec<Finding>,
) {
    if let Some(secret) = secret {
        if !verify(token, secret) {
            findings.push(Finding::BadSignature { field });
        }
    }

    match decode_claims(token) {
        Ok(claims) => {
            if claims.iss == DEMO_ISSUER {
                findings.push(Finding::DemoKey { field });
            }
            if claims.role != expected.as_str() {
                findings.push(Finding::WrongRole { field, expected, found: claims.role.clone() });
            }
            if claims.is_expired_at(now) {
                findings.push(Finding::ExpiredKey { field });
            }
        }
        Err(e) => {
            tracing::debug!(field, error = %e, "key claims could not be decoded");
        }
    }
}

/// Probe the running API gateway for a CORS preflight response.
///
/// The gateway port is read from `KONG_HTTP_PORT` in `env_text`.
pub async fn audit_live(host: &str, env_text: &str) -> Vec<Finding> {
    let field = Service::GatewayHttp.env_key();
    let Some(port) = env_value(env_text, field).and_then(|p| p.trim().parse::<u16>().ok()) else {
        return vec![Finding::MissingField { field }];
    };

    let headers = [("Origin", CORS_PROBE_ORIGIN), ("Access-Control-Request-Method", "GET")];
    match http::probe(host, port, Method::OPTIONS, "/rest/v1/", &headers).await {
        Ok(resp) => {
            tracing::debug!(port, status = %resp.status, "CORS preflight answered");
            if resp.headers.contains_key("access-control-allow-origin") {
                Vec::new()
            } else {
                vec![Finding::CorsNotConfigured { port }]
            }
        }
        Err(e) => vec![Finding::GatewayUnreachable { port, reason: e.to_string() }],
    }
}
