/// Errors produced by the `berth-core` crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A topology listed the same service more than once.
    #[error("service '{service}' appears more than once in the topology")]
    DuplicateService { service: String },

    /// Two services were assigned the same host port.
    #[error("port {port} assigned to both '{first}' and '{second}'")]
    DuplicatePort {
        port: u16,
        first: String,
        second: String,
    },

    /// Port 0 is never a bindable service port.
    #[error("port 0 assigned to '{service}'")]
    ZeroPort { service: String },

    /// A claims payload violated `exp > iat`.
    #[error("invalid claims: exp {exp} must be greater than iat {iat}")]
    InvalidClaims { iat: i64, exp: i64 },

    /// A service key did not name a known service.
    #[error("unknown service '{0}'")]
    UnknownService(String),
}
