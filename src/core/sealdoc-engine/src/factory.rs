//! Engine factory.
//!
//! The only way to obtain an engine. Each constructor checks the feature
//! flag, validates the whole configuration and the sub-fields the engine
//! depends on, then binds the engine to a copy of the configuration.

use crate::cert::DsaCertificate;
use crate::cipher::SymmetricCipher;
use crate::config::{CryptoConfig, IntegrityKind};
use crate::digest::MessageDigest;
use crate::error::{ConfigError, EngineError};
use crate::pbe::PasswordDeriver;
use crate::traits::{CertEngine, CipherEngine, DigestEngine, PbeEngine};

/// Creates a cipher engine.
///
/// Under PBE the key must already have been derived.
pub fn create_cipher(config: &CryptoConfig) -> Result<Box<dyn CipherEngine>, EngineError> {
    if !config.encrypt_active {
        return Err(ConfigError::Inactive("encryption").into());
    }
    config.validate()?;
    if config.pbe_active && config.key.is_none() {
        return Err(ConfigError::MissingField("key").into());
    }
    Ok(Box::new(SymmetricCipher::new(config)?))
}

/// Creates a key derivation engine. Requires a non-empty password.
pub fn create_pbe(config: &CryptoConfig) -> Result<Box<dyn PbeEngine>, EngineError> {
    if !config.pbe_active {
        return Err(ConfigError::Inactive("password-based encryption").into());
    }
    config.validate()?;
    Ok(Box::new(PasswordDeriver::new(config)?))
}

/// Creates a hash/MAC engine.
pub fn create_digest(config: &CryptoConfig) -> Result<Box<dyn DigestEngine>, EngineError> {
    check_integrity(config, IntegrityKind::Digest)?;
    Ok(Box::new(MessageDigest::new(config)))
}

/// Creates a DSA engine.
pub fn create_cert(config: &CryptoConfig) -> Result<Box<dyn CertEngine>, EngineError> {
    check_integrity(config, IntegrityKind::Dsa)?;
    Ok(Box::new(DsaCertificate::new(config)?))
}

fn check_integrity(config: &CryptoConfig, expected: IntegrityKind) -> Result<(), ConfigError> {
    if !config.integrity_active {
        return Err(ConfigError::Inactive("integrity"));
    }
    config.validate()?;
    if config.integrity_kind != expected {
        return Err(ConfigError::WrongIntegrityKind {
            expected,
            actual: config.integrity_kind,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::config::{BlockMode, PbeAlgorithm};

    fn err<T>(result: Result<T, EngineError>) -> EngineError {
        match result {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_inactive_features_rejected() {
        let mut config = CryptoConfig::new();
        config.set_encrypt_active(false);

        assert!(matches!(
            err(create_cipher(&config)),
            EngineError::Config(ConfigError::Inactive("encryption"))
        ));
        assert!(matches!(
            err(create_pbe(&config)),
            EngineError::Config(ConfigError::Inactive(_))
        ));
        assert!(matches!(
            err(create_digest(&config)),
            EngineError::Config(ConfigError::Inactive("integrity"))
        ));
        assert!(matches!(
            err(create_cert(&config)),
            EngineError::Config(ConfigError::Inactive("integrity"))
        ));
    }

    #[test]
    fn test_wrong_integrity_kind() {
        let mut config = CryptoConfig::new();
        config.set_integrity_active(true);

        assert!(create_digest(&config).is_ok());
        assert!(matches!(
            err(create_cert(&config)),
            EngineError::Config(ConfigError::WrongIntegrityKind {
                expected: IntegrityKind::Dsa,
                actual: IntegrityKind::Digest,
            })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = CryptoConfig::new();
        config.block_mode = BlockMode::None;
        assert!(matches!(
            err(create_cipher(&config)),
            EngineError::Config(ConfigError::Unsupported { field: "block_mode", .. })
        ));
    }

    #[test]
    fn test_pbe_requirements() {
        let mut config = CryptoConfig::new();
        config.set_pbe_active(true);
        config.set_pbe_algorithm(PbeAlgorithm::Scrypt).unwrap();

        assert!(matches!(
            err(create_pbe(&config)),
            EngineError::Config(ConfigError::MissingField("pbe_password"))
        ));
        // No derived key yet.
        assert!(matches!(
            err(create_cipher(&config)),
            EngineError::Config(ConfigError::MissingField("key"))
        ));

        config.set_password("secret");
        let derived = create_pbe(&config).unwrap().derive_key().unwrap();
        assert!(create_cipher(&derived).is_ok());
    }
}
