//! Symmetric cipher engine.

use tracing::debug;
use zeroize::Zeroizing;

use sealdoc_crypto::{random, CryptoError, ModeStrategy, PaddingScheme, SecretBytes};

use crate::config::{BlockMode, CipherAlgorithm, CryptoConfig, Padding};
use crate::encoding;
use crate::error::{ConfigError, EngineError};
use crate::traits::CipherEngine;

/// Resolves the primitive strategy for a configuration.
pub fn mode_strategy(config: &CryptoConfig) -> Result<ModeStrategy, ConfigError> {
    let strategy = match (config.cipher_algorithm, config.block_mode, config.padding) {
        (CipherAlgorithm::Rc4, BlockMode::None, Padding::None) => ModeStrategy::Rc4,
        (CipherAlgorithm::Aes, BlockMode::Ecb, padding) => ModeStrategy::Ecb(padding_scheme(padding)?),
        (CipherAlgorithm::Aes, BlockMode::Cbc, padding) => ModeStrategy::Cbc(padding_scheme(padding)?),
        (CipherAlgorithm::Aes, BlockMode::Cts, Padding::None) => ModeStrategy::Cts,
        (CipherAlgorithm::Aes, BlockMode::Ofb, Padding::None) => ModeStrategy::Ofb,
        (CipherAlgorithm::Aes, BlockMode::Gcm, Padding::None) => ModeStrategy::Gcm,
        (algorithm, mode, padding) => {
            return Err(ConfigError::Unsupported {
                field: "cipher",
                value: format!("{}/{}/{}", algorithm, mode, padding),
            })
        }
    };
    Ok(strategy)
}

fn padding_scheme(padding: Padding) -> Result<PaddingScheme, ConfigError> {
    match padding {
        Padding::Pkcs7 => Ok(PaddingScheme::Pkcs7),
        Padding::ZeroByte => Ok(PaddingScheme::ZeroByte),
        Padding::None => Err(ConfigError::Unsupported {
            field: "padding",
            value: padding.to_string(),
        }),
    }
}

/// AES or RC4 bound to one key and IV.
///
/// A missing key or IV is generated on construction. Such an engine can
/// encrypt but refuses to decrypt, since nothing could have been encrypted
/// under material that did not exist yet.
pub struct SymmetricCipher {
    config: CryptoConfig,
    strategy: ModeStrategy,
    key: SecretBytes,
    iv: Vec<u8>,
    fresh_key: bool,
    fresh_iv: bool,
}

impl SymmetricCipher {
    pub(crate) fn new(config: &CryptoConfig) -> Result<Self, EngineError> {
        let strategy = mode_strategy(config)?;

        let (key, fresh_key) = match &config.key {
            Some(key) => (SecretBytes::with_len(key.as_bytes(), config.key_len())?, false),
            None if config.pbe_active => return Err(ConfigError::MissingField("key").into()),
            None => (SecretBytes::generate(config.key_len()), true),
        };

        let (iv, fresh_iv) = match (strategy.iv_len(), &config.iv_or_salt) {
            (None, _) => (Vec::new(), false),
            (Some(len), Some(iv)) if iv.len() == len => (iv.clone(), false),
            (Some(len), Some(iv)) => {
                return Err(CryptoError::InvalidIv(format!(
                    "expected {} bytes, got {}",
                    len,
                    iv.len()
                ))
                .into())
            }
            (Some(len), None) => (random::generate_bytes(len), true),
        };

        Ok(Self {
            config: config.clone(),
            strategy,
            key,
            iv,
            fresh_key,
            fresh_iv,
        })
    }
}

impl CipherEngine for SymmetricCipher {
    fn encrypt(&self, plaintext: &str) -> Result<CryptoConfig, EngineError> {
        let ciphertext = self
            .strategy
            .encrypt(self.key.as_bytes(), &self.iv, plaintext.as_bytes())?;

        let mut config = self.config.clone();
        config.key = Some(self.key.clone());
        if !self.iv.is_empty() {
            config.iv_or_salt = Some(self.iv.clone());
        }
        config.cipher_text = Some(encoding::encode(&ciphertext));
        config.signature = None;

        debug!(
            algorithm = %config.cipher_algorithm,
            mode = %config.block_mode,
            key_size = config.key_size,
            ciphertext_len = ciphertext.len(),
            "Encrypted document"
        );
        Ok(config)
    }

    fn decrypt(&self, cipher_text: &str) -> Result<String, EngineError> {
        if self.fresh_key {
            return Err(ConfigError::MissingField("key").into());
        }
        if self.fresh_iv {
            return Err(ConfigError::MissingField("iv_or_salt").into());
        }

        let ciphertext = encoding::decode("cipher_text", cipher_text)?;
        let plaintext = Zeroizing::new(self.strategy.decrypt(
            self.key.as_bytes(),
            &self.iv,
            &ciphertext,
        )?);

        debug!(
            algorithm = %self.config.cipher_algorithm,
            mode = %self.config.block_mode,
            "Decrypted document"
        );
        String::from_utf8(plaintext.to_vec()).map_err(|_| CryptoError::InvalidUtf8.into())
    }
}
