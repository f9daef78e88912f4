//! Cryptographic logics.

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use rand::Rng;
use rand::rngs::OsRng;

use crate::config::Argon2 as ArgonConfig;
use crate::policy;

const GENERATED_PASSWORD_LENGTH: usize = 12;
const GENERATED_PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

type Result<T> = std::result::Result<T, CryptoError>;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
}

/// Cryptographic manager.
pub struct Crypto {
    pub pwd: PasswordManager,
}

impl Crypto {
    /// Create a new [`Crypto`].
    pub fn new(config: Option<ArgonConfig>) -> Result<Self> {
        let pwd = PasswordManager::new(config)?;

        Ok(Self { pwd })
    }
}

/// Password manager that uses Argon2id and PHC string format for hashing and
/// verification.
pub struct PasswordManager {
    params: Params,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`].
    pub fn new(config: Option<ArgonConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();

        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2 {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
    }

    /// Hash password using Argon2id.
    ///
    /// A fresh random salt is drawn per call, so two hashes of the same
    /// plaintext never match.
    pub fn hash_password(&self, password: impl AsRef<[u8]>) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_ref(), &salt)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Verify password against a PHC string.
    ///
    /// Comparison happens inside argon2, never by re-hashing and comparing
    /// digests. Unparsable digests count as a mismatch.
    pub fn verify_password(
        &self,
        password: impl AsRef<[u8]>,
        phc_hash: &str,
    ) -> bool {
        let Ok(parsed) = PasswordHash::new(phc_hash) else {
            return false;
        };

        self.argon2()
            .verify_password(password.as_ref(), &parsed)
            .is_ok()
    }
}

/// Generate a one-time password for admin-initiated resets.
///
/// Characters are drawn uniformly from letters, digits and a fixed
/// punctuation set with the OS CSPRNG, and resampled until the result
/// satisfies [`policy::validate_password`].
pub fn generate_password() -> String {
    loop {
        let password: String = (0..GENERATED_PASSWORD_LENGTH)
            .map(|_| {
                let index = OsRng.gen_range(0..GENERATED_PASSWORD_ALPHABET.len());
                GENERATED_PASSWORD_ALPHABET[index] as char
            })
            .collect();

        if policy::validate_password(&password).is_ok() {
            return password;
        }
    }
}

/// [`Crypto`] with cheap hashing parameters, for tests only.
#[cfg(test)]
pub(crate) fn test_crypto() -> std::sync::Arc<Crypto> {
    std::sync::Arc::new(
        Crypto::new(Some(ArgonConfig {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
            hash_length: 32,
        }))
        .unwrap(),
    )
}
