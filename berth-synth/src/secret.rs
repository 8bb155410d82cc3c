//! Random alphanumeric secret generation.

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{CryptoRng, Rng, RngCore, SeedableRng};

use berth_core::Secret;

use crate::SynthError;

/// Generates secrets drawn uniformly from `[A-Za-z0-9]`.
///
/// The random source is owned by the generator so callers (and tests) can
/// supply a seeded one. Each call draws fresh output from the source.
#[derive(Debug)]
pub struct SecretGenerator<R> {
    rng: R,
}

impl SecretGenerator<StdRng> {
    /// A generator seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }
}

impl<R: RngCore + CryptoRng> SecretGenerator<R> {
    /// A generator backed by the given random source.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generate a secret of exactly `length` characters.
    ///
    /// # Errors
    /// Returns [`SynthError::InvalidSecretLength`] if `length` is zero.
    pub fn generate(&mut self, length: usize) -> Result<Secret, SynthError> {
        if length == 0 {
            return Err(SynthError::InvalidSecretLength { length });
        }
        let value: String = std::iter::repeat_with(|| char::from(self.rng.sample(Alphanumeric)))
            .take(length)
            .collect();
        Ok(Secret::new(value))
    }

    /// The underlying random source, for other draws in the same run.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}
