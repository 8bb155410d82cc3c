//! Keys command: mint a fresh signing secret and role keys.

use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use clap::Args;
use indexmap::IndexMap;
use rand::{CryptoRng, RngCore};

use berth_core::{Role, Secret, Token};
use berth_synth::{mint_role_token, SecretGenerator, SynthConfig, TokenPolicy, DEFAULT_SIGNING_SECRET_LENGTH};

use crate::error::{CliError, Result};
use crate::project::patch_env_file;

/// Generate a signing secret and role keys, optionally patching an env file
#[derive(Args, Debug)]
pub struct KeysArgs {
    /// Env file whose JWT_SECRET, ANON_KEY and SERVICE_ROLE_KEY are replaced
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Length of the generated signing secret
    #[arg(long, default_value_t = DEFAULT_SIGNING_SECRET_LENGTH)]
    pub secret_length: usize,

    /// Validity of the minted keys, in years
    #[arg(long, default_value_t = 10)]
    pub expiry_years: u32,
}

impl KeysArgs {
    /// Reject flag values that cannot produce a usable key set.
    ///
    /// # Errors
    /// Returns [`CliError::InvalidArgument`] for a zero secret length or a
    /// zero validity.
    pub fn validate(&self) -> Result<()> {
        if self.secret_length == 0 {
            return Err(CliError::InvalidArgument("--secret-length must be at least 1".to_owned()));
        }
        if self.expiry_years == 0 {
            return Err(CliError::InvalidArgument("--expiry-years must be at least 1".to_owned()));
        }
        Ok(())
    }
}

/// A signing secret with the two role keys signed by it.
#[derive(Debug, Clone)]
pub struct KeySet {
    pub jwt_secret: Secret,
    pub anon_key: Token,
    pub service_role_key: Token,
}

impl KeySet {
    /// The key set as env file assignments, in file order.
    #[must_use]
    pub fn assignments(&self) -> IndexMap<String, String> {
        let mut fields = IndexMap::new();
        fields.insert("JWT_SECRET".to_owned(), self.jwt_secret.expose().to_owned());
        fields.insert("ANON_KEY".to_owned(), self.anon_key.to_string());
        fields.insert("SERVICE_ROLE_KEY".to_owned(), self.service_role_key.to_string());
        fields
    }
}

/// Generate a key set.
///
/// # Errors
/// Returns a synthesis error for a zero-length secret or a zero validity.
pub fn generate<R: RngCore + CryptoRng>(
    secrets: &mut SecretGenerator<R>,
    secret_length: usize,
    policy: &TokenPolicy,
    now: DateTime<Utc>,
) -> Result<KeySet> {
    let jwt_secret = secrets.generate(secret_length)?;
    let anon_key = mint_role_token(Role::Anon, &jwt_secret, policy, now)?;
    let service_role_key = mint_role_token(Role::ServiceRole, &jwt_secret, policy, now)?;
    Ok(KeySet { jwt_secret, anon_key, service_role_key })
}

pub async fn run(args: KeysArgs, config: &SynthConfig) -> Result<()> {
    args.validate()?;
    let policy = TokenPolicy::new(config.token_policy.issuer.clone(), args.expiry_years.saturating_mul(365));
    let mut secrets = SecretGenerator::from_entropy();
    let keys = generate(&mut secrets, args.secret_length, &policy, Utc::now())?;

    let Some(path) = args.env_file else {
        println!("JWT_SECRET={}", keys.jwt_secret.expose());
        println!("ANON_KEY={}", keys.anon_key);
        println!("SERVICE_ROLE_KEY={}", keys.service_role_key);
        return Ok(());
    };

    let (backup, outcome) = patch_env_file(&path, &keys.assignments(), Local::now().naive_local()).await?;
    println!("Backed up {} to {}", path.display(), backup.display());
    println!("Updated {} field(s) in {}", outcome.patched.len(), path.display());
    for field in &outcome.missing {
        println!("  {field} not found, left unset");
    }
    println!("Restart the stack for the new keys to take effect.");
    Ok(())
}
