//! Port availability probing.
//!
//! A probe is a point-in-time observation. Another process may bind the
//! port between the probe and the moment the consuming service starts; the
//! allocator does not try to close that window.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::SynthConfig;

/// Answers whether a local TCP port currently has a listener.
///
/// Implementations must be `Send + Sync` so one prober can be shared across
/// allocation passes.
#[async_trait]
pub trait PortProber: Send + Sync {
    /// Returns `true` if nothing accepts connections on `port`.
    async fn is_port_free(&self, port: u16) -> bool;
}

/// Probes by opening a TCP connection to `host:port`.
///
/// A successful connect means the port is taken. A refused or timed-out
/// connect means it is free.
#[derive(Debug, Clone)]
pub struct TcpProber {
    host: String,
    timeout: Duration,
}

impl TcpProber {
    /// Create a prober for `host` with a per-connect timeout.
    pub fn new(host: impl Into<String>, timeout: Duration) -> Self {
        Self { host: host.into(), timeout }
    }

    /// Create a prober using the host and timeout from `config`.
    #[must_use]
    pub fn from_config(config: &SynthConfig) -> Self {
        Self::new(config.probe_host.clone(), config.probe_timeout)
    }
}

impl Default for TcpProber {
    fn default() -> Self {
        Self::from_config(&SynthConfig::default())
    }
}

#[async_trait]
impl PortProber for TcpProber {
    async fn is_port_free(&self, port: u16) -> bool {
        let connect = TcpStream::connect((self.host.as_str(), port));
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_stream)) => {
                tracing::debug!(port, host = %self.host, "port has a listener");
                false
            }
            Ok(Err(e)) => {
                tracing::trace!(port, error = %e, "connect failed, port is free");
                true
            }
            Err(_) => {
                tracing::debug!(
                    port,
                    timeout_ms = self.timeout.as_millis(),
                    "probe timed out, treating port as free"
                );
                true
            }
        }
    }
}
