//! Hash and MAC integrity engine.

use tracing::debug;

use sealdoc_crypto::mac::{self, CMAC_KEY_SIZE, HMAC_KEY_SIZE};
use sealdoc_crypto::SecretBytes;

use crate::config::{CryptoConfig, IntegrityOption};
use crate::encoding;
use crate::error::{ConfigError, EngineError};
use crate::traits::DigestEngine;

/// Computes SHA-256, AES-CMAC or HMAC-SHA256 tags over the ciphertext string.
pub struct MessageDigest {
    config: CryptoConfig,
    key: Option<SecretBytes>,
    fresh_key: bool,
}

impl MessageDigest {
    pub(crate) fn new(config: &CryptoConfig) -> Self {
        let key_len = match config.integrity_option {
            IntegrityOption::Sha256 => None,
            IntegrityOption::AesCmac => Some(CMAC_KEY_SIZE),
            IntegrityOption::HmacSha256 => Some(HMAC_KEY_SIZE),
        };

        let (key, fresh_key) = match (key_len, &config.digest_key) {
            (None, _) => (None, false),
            (Some(_), Some(key)) => (Some(key.clone()), false),
            (Some(len), None) => (Some(SecretBytes::generate(len)), true),
        };

        Self {
            config: config.clone(),
            key,
            fresh_key,
        }
    }

    fn tag(&self, message: &[u8]) -> Result<Vec<u8>, EngineError> {
        let key = || {
            self.key
                .as_ref()
                .ok_or(ConfigError::MissingField("digest_key"))
        };
        let tag = match self.config.integrity_option {
            IntegrityOption::Sha256 => mac::sha256(message),
            IntegrityOption::AesCmac => mac::aes_cmac(key()?.as_bytes(), message)?,
            IntegrityOption::HmacSha256 => mac::hmac_sha256(key()?.as_bytes(), message)?,
        };
        Ok(tag)
    }
}

impl DigestEngine for MessageDigest {
    fn sign(&self, message: &str) -> Result<CryptoConfig, EngineError> {
        let tag = self.tag(message.as_bytes())?;

        debug!(
            option = %self.config.integrity_option,
            tag_len = tag.len(),
            "Computed integrity tag"
        );

        let mut config = self.config.clone();
        config.digest_key = self.key.clone();
        config.signature = Some(encoding::encode(&tag));
        Ok(config)
    }

    fn verify(&self, signature: &str, message: &str) -> Result<bool, EngineError> {
        if self.fresh_key {
            return Err(ConfigError::MissingField("digest_key").into());
        }
        let Ok(expected) = encoding::decode("signature", signature) else {
            return Ok(false);
        };

        let actual = self.tag(message.as_bytes())?;
        Ok(mac::tags_match(&expected, &actual))
    }
}
