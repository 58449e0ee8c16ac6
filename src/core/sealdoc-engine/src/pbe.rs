//! Password-based key derivation engine.

use tracing::debug;

use sealdoc_crypto::kdf::{self, Pbkdf2Hash};
use sealdoc_crypto::symmetric::BLOCK_SIZE;
use sealdoc_crypto::{random, SecretBytes};

use crate::config::{CipherAlgorithm, CryptoConfig, PbeAlgorithm, PbeDigest};
use crate::error::{ConfigError, EngineError};
use crate::traits::PbeEngine;

/// Derives the cipher key from a password with PBKDF2 or scrypt.
///
/// The salt is taken from `iv_or_salt` when present so a loaded document
/// derives the same key; otherwise a fresh one is generated. AES salts are
/// one block long because they double as the IV.
pub struct PasswordDeriver {
    config: CryptoConfig,
    password: SecretBytes,
    salt: Vec<u8>,
}

impl PasswordDeriver {
    pub(crate) fn new(config: &CryptoConfig) -> Result<Self, EngineError> {
        let password = match &config.pbe_password {
            Some(password) if !password.is_empty() => password.clone(),
            _ => return Err(ConfigError::MissingField("pbe_password").into()),
        };

        let salt = match (&config.iv_or_salt, config.cipher_algorithm) {
            (Some(salt), CipherAlgorithm::Aes) if salt.len() != BLOCK_SIZE => {
                return Err(ConfigError::InvalidValue {
                    field: "iv_or_salt",
                    value: format!("{}-byte salt, expected {}", salt.len(), BLOCK_SIZE),
                }
                .into())
            }
            (Some(salt), _) if salt.is_empty() => {
                return Err(ConfigError::InvalidValue {
                    field: "iv_or_salt",
                    value: "empty salt".to_string(),
                }
                .into())
            }
            (Some(salt), _) => salt.clone(),
            (None, CipherAlgorithm::Aes) => random::generate_bytes(BLOCK_SIZE),
            (None, CipherAlgorithm::Rc4) => random::generate_bytes(password.len()),
        };

        Ok(Self {
            config: config.clone(),
            password,
            salt,
        })
    }
}

impl PbeEngine for PasswordDeriver {
    fn derive_key(&self) -> Result<CryptoConfig, EngineError> {
        let digest = self.config.derived_pbe_digest();
        let key_len = self.config.key_len();

        let key = match (self.config.pbe_algorithm, digest) {
            (PbeAlgorithm::Scrypt, _) => {
                kdf::scrypt_derive(self.password.as_bytes(), &self.salt, key_len)?
            }
            (PbeAlgorithm::Pbkdf2, PbeDigest::Sha1) => kdf::pbkdf2_derive(
                self.password.as_bytes(),
                &self.salt,
                Pbkdf2Hash::Sha1,
                key_len,
            )?,
            (PbeAlgorithm::Pbkdf2, _) => kdf::pbkdf2_derive(
                self.password.as_bytes(),
                &self.salt,
                Pbkdf2Hash::Sha256,
                key_len,
            )?,
        };

        debug!(
            algorithm = %self.config.pbe_algorithm,
            digest = %digest,
            salt_len = self.salt.len(),
            key_size = self.config.key_size,
            "Derived key from password"
        );

        let mut config = self.config.clone();
        config.pbe_digest = digest;
        config.key = Some(SecretBytes::from(key));
        config.iv_or_salt = Some(self.salt.clone());
        Ok(config)
    }
}
