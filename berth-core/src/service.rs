use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A logical service in the deployment topology.
///
/// The set is closed: every service that needs a host port is listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    /// Plain-HTTP listener of the API gateway.
    GatewayHttp,
    /// TLS listener of the API gateway.
    GatewayHttps,
    /// The Postgres database.
    Database,
    /// Transaction-mode connection pooler in front of the database.
    Pooler,
    /// Admin dashboard.
    Studio,
    /// Telemetry / log analytics endpoint.
    Analytics,
}

impl Service {
    /// All services, in allocation order.
    pub const ALL: [Service; 6] = [
        Service::GatewayHttp,
        Service::GatewayHttps,
        Service::Database,
        Service::Pooler,
        Service::Studio,
        Service::Analytics,
    ];

    /// Stable snake_case key (e.g. `"gateway_http"`).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Service::GatewayHttp => "gateway_http",
            Service::GatewayHttps => "gateway_https",
            Service::Database => "database",
            Service::Pooler => "pooler",
            Service::Studio => "studio",
            Service::Analytics => "analytics",
        }
    }

    /// Offset from the base port where this service starts searching.
    #[must_use]
    pub const fn default_offset(self) -> u16 {
        match self {
            Service::GatewayHttp => 0,
            Service::GatewayHttps => 443,
            Service::Database => 1000,
            Service::Pooler => 1001,
            Service::Studio => 2000,
            Service::Analytics => 3000,
        }
    }

    /// The `.env` variable the assigned port is written to.
    #[must_use]
    pub const fn env_key(self) -> &'static str {
        match self {
            Service::GatewayHttp => "KONG_HTTP_PORT",
            Service::GatewayHttps => "KONG_HTTPS_PORT",
            Service::Database => "POSTGRES_PORT",
            Service::Pooler => "POOLER_PROXY_PORT_TRANSACTION",
            Service::Studio => "STUDIO_PORT",
            Service::Analytics => "ANALYTICS_PORT",
        }
    }

    /// Human-readable label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Service::GatewayHttp => "API gateway (HTTP)",
            Service::GatewayHttps => "API gateway (HTTPS)",
            Service::Database => "PostgreSQL",
            Service::Pooler => "Connection pooler",
            Service::Studio => "Studio dashboard",
            Service::Analytics => "Analytics",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Service {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Service::ALL
            .into_iter()
            .find(|service| service.key() == s)
            .ok_or_else(|| CoreError::UnknownService(s.to_owned()))
    }
}

/// The fixed set of services and the offset each one searches from.
///
/// Entries are kept in the order they were given; the allocator resolves
/// them in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct Topology {
    entries: Vec<(Service, u16)>,
}

impl Topology {
    /// Build a topology from `(service, offset)` pairs.
    ///
    /// # Errors
    /// Returns [`CoreError::DuplicateService`] if a service is listed twice.
    pub fn new(entries: Vec<(Service, u16)>) -> Result<Self, CoreError> {
        for (i, (service, _)) in entries.iter().enumerate() {
            if entries[..i].iter().any(|(seen, _)| seen == service) {
                return Err(CoreError::DuplicateService {
                    service: service.key().to_owned(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// The six-service deployment with the default offsets.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            entries: Service::ALL
                .into_iter()
                .map(|service| (service, service.default_offset()))
                .collect(),
        }
    }

    /// Iterate `(service, offset)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (Service, u16)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of services in the topology.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the topology has no services.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::standard()
    }
}
