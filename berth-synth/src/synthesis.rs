//! One-shot synthesis: secrets, role tokens, then ports.

use chrono::{DateTime, Utc};
use rand::{CryptoRng, RngCore};

use berth_core::{PortMap, Role, Secret, Token};

use crate::allocator::random_start;
use crate::{mint_role_token, PortAllocator, PortProber, SecretGenerator, SynthConfig, SynthError};

/// Generic credentials that are not token material.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Database superuser password.
    pub postgres_password: Secret,
    /// Session key base for the realtime service.
    pub secret_key_base: Secret,
    /// Encryption key for the vault extension.
    pub vault_enc_key: Secret,
    /// API key shared by the analytics backend and its clients.
    pub logflare_api_key: Secret,
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// Base port the offsets were applied to.
    pub base_port: u16,
    /// Port assigned to each service.
    pub ports: PortMap,
    /// HS256 signing secret shared by every token-verifying service.
    pub jwt_secret: Secret,
    /// Low-privilege role token.
    pub anon_key: Token,
    /// Elevated role token.
    pub service_role_key: Token,
    /// Independent generic credentials.
    pub credentials: Credentials,
}

/// Run the engine once.
///
/// Secrets are generated first, then both role tokens are minted, then
/// ports are allocated. If `base` is `None`, the start port is drawn from
/// `config.base_port_range` using the generator's random source.
///
/// # Errors
/// Returns [`SynthError::PortExhausted`] if any service cannot be placed,
/// or a minting/generation error. Nothing partial is returned.
pub async fn synthesize<P, R>(
    config: &SynthConfig,
    base: Option<u16>,
    allocator: &PortAllocator<P>,
    secrets: &mut SecretGenerator<R>,
    now: DateTime<Utc>,
) -> Result<Synthesis, SynthError>
where
    P: PortProber,
    R: RngCore + CryptoRng,
{
    let jwt_secret = secrets.generate(config.signing_secret_length)?;
    let credentials = Credentials {
        postgres_password: secrets.generate(config.secret_length)?,
        secret_key_base: secrets.generate(config.secret_key_base_length)?,
        vault_enc_key: secrets.generate(config.secret_length)?,
        logflare_api_key: secrets.generate(config.secret_length)?,
    };

    let anon_key = mint_role_token(Role::Anon, &jwt_secret, &config.token_policy, now)?;
    let service_role_key = mint_role_token(Role::ServiceRole, &jwt_secret, &config.token_policy, now)?;

    let (base_port, ports) = match base {
        Some(base) => (base, allocator.allocate(base).await?),
        None => {
            let start = random_start(secrets.rng_mut(), &config.base_port_range);
            tracing::debug!(start, "no base port given, probing from random start");
            allocator.allocate_from(start).await?
        }
    };

    tracing::info!(base_port, %ports, "synthesis complete");

    Ok(Synthesis {
        base_port,
        ports,
        jwt_secret,
        anon_key,
        service_role_key,
        credentials,
    })
}
