//! Save and load orchestration.
//!
//! Save: PBE derive, encrypt, integrity. Load: integrity verify, PBE
//! re-derive, decrypt. Every stage takes the previous record and returns a
//! new one.

use std::path::Path;

use tracing::{info, warn};

use sealdoc_crypto::SecretBytes;
use sealdoc_storage::{DocumentStore, SecretKind};

use crate::config::{CryptoConfig, IntegrityKind};
use crate::encoding;
use crate::error::{ConfigError, EngineError, PipelineError};
use crate::factory;

/// Outcome of the integrity check on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityStatus {
    /// Integrity protection is off for this document.
    NotChecked,
    /// Tag or signature matched.
    Verified,
    /// Tag or signature did not match.
    Mismatch,
}

impl std::fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotChecked => write!(f, "not checked"),
            Self::Verified => write!(f, "verified"),
            Self::Mismatch => write!(f, "MISMATCH"),
        }
    }
}

/// Result of loading a document.
///
/// The integrity outcome and the decryption outcome are independent: a
/// mismatch is reported, and decryption is still attempted.
#[derive(Debug)]
pub struct LoadReport {
    /// Integrity check outcome.
    pub integrity: IntegrityStatus,
    /// Recovered text, or why it could not be recovered.
    pub plaintext: Result<String, EngineError>,
}

/// Runs the save sequence in memory.
///
/// Key, IV and salt left over from an earlier save are discarded, so a
/// config returned by one save can be fed straight into the next one.
pub fn protect(mut config: CryptoConfig, plaintext: &str) -> Result<CryptoConfig, EngineError> {
    config.validate()?;

    config.key = None;
    config.iv_or_salt = None;
    config.cipher_text = None;
    config.signature = None;

    let config = if config.pbe_active {
        factory::create_pbe(&config)?.derive_key()?
    } else {
        config
    };

    let config = if config.encrypt_active {
        factory::create_cipher(&config)?.encrypt(plaintext)?
    } else {
        let mut stored = config;
        stored.cipher_text = Some(plaintext.to_string());
        stored.signature = None;
        stored
    };

    if !config.integrity_active {
        return Ok(config);
    }

    let message = config
        .cipher_text
        .clone()
        .ok_or(ConfigError::MissingField("cipher_text"))?;

    match config.integrity_kind {
        IntegrityKind::Digest => factory::create_digest(&config)?.sign(&message),
        IntegrityKind::Dsa => {
            let mut cert = factory::create_cert(&config)?;
            cert.generate_certs()?;
            cert.sign(&message)
        }
    }
}

/// Runs the load sequence in memory.
///
/// Errors are returned only for problems that prevent running the
/// sequence at all; decryption failures land in [`LoadReport::plaintext`].
pub fn unprotect(config: &CryptoConfig) -> Result<LoadReport, EngineError> {
    config.validate()?;

    let message = config
        .cipher_text
        .as_deref()
        .ok_or(ConfigError::MissingField("cipher_text"))?;

    let integrity = if config.integrity_active {
        let signature = config
            .signature
            .as_deref()
            .ok_or(ConfigError::MissingField("signature"))?;

        let verified = match config.integrity_kind {
            IntegrityKind::Digest => factory::create_digest(config)?.verify(signature, message)?,
            IntegrityKind::Dsa => factory::create_cert(config)?.verify(signature, message)?,
        };

        if verified {
            IntegrityStatus::Verified
        } else {
            warn!(kind = %config.integrity_kind, "Integrity check failed");
            IntegrityStatus::Mismatch
        }
    } else {
        IntegrityStatus::NotChecked
    };

    Ok(LoadReport {
        integrity,
        plaintext: recover(config, message),
    })
}

fn recover(config: &CryptoConfig, message: &str) -> Result<String, EngineError> {
    if !config.encrypt_active {
        return Ok(message.to_string());
    }

    let derived;
    let config = if config.pbe_active {
        derived = factory::create_pbe(config)?.derive_key()?;
        &derived
    } else {
        config
    };

    factory::create_cipher(config)?.decrypt(message)
}

/// Protects documents and persists them through a [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct Pipeline<S> {
    store: S,
}

impl<S: DocumentStore> Pipeline<S> {
    /// Creates a pipeline over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Protects `plaintext` and writes the record and its sidecars.
    ///
    /// Nothing is written unless the whole save sequence succeeds. Sidecars
    /// for secrets the new configuration lacks are removed.
    pub fn save(
        &self,
        path: &Path,
        config: CryptoConfig,
        plaintext: &str,
    ) -> Result<CryptoConfig, PipelineError> {
        let protected = protect(config, plaintext)?;

        let public_key = protected
            .signature_public_key
            .as_deref()
            .map(|encoded| encoding::decode("signature_public_key", encoded))
            .transpose()?;
        // Under PBE the password is the only route back to the key.
        let key = protected
            .key
            .as_ref()
            .filter(|_| !protected.pbe_active)
            .map(SecretBytes::as_bytes);

        let secrets = [
            (SecretKind::Key, key),
            (
                SecretKind::DigestKey,
                protected.digest_key.as_ref().map(SecretBytes::as_bytes),
            ),
            (
                SecretKind::PrivateKey,
                protected.signature_private_key.as_ref().map(SecretBytes::as_bytes),
            ),
            (SecretKind::PublicKey, public_key.as_deref()),
        ];
        self.store
            .save_document(path, &protected.redacted_for_storage(), &secrets)?;

        info!(
            path = %path.display(),
            encrypted = protected.encrypt_active,
            pbe = protected.pbe_active,
            integrity = protected.integrity_active,
            "Document saved"
        );
        Ok(protected)
    }

    /// Reads a document and runs the load sequence.
    ///
    /// `password` is required for PBE documents and ignored otherwise.
    pub fn load(&self, path: &Path, password: Option<&str>) -> Result<LoadReport, PipelineError> {
        let mut config: CryptoConfig = self.store.load_record(path)?;

        config.key = self.read_secret(path, SecretKind::Key)?;
        config.digest_key = self.read_secret(path, SecretKind::DigestKey)?;
        config.signature_private_key = self.read_secret(path, SecretKind::PrivateKey)?;
        config.signature_public_key = self
            .read_secret(path, SecretKind::PublicKey)?
            .map(|der| encoding::encode(der.as_bytes()));
        config.pbe_password = password.map(SecretBytes::from);

        let report = unprotect(&config)?;

        info!(
            path = %path.display(),
            integrity = %report.integrity,
            decrypted = report.plaintext.is_ok(),
            "Document loaded"
        );
        Ok(report)
    }

    fn read_secret(&self, path: &Path, kind: SecretKind) -> Result<Option<SecretBytes>, PipelineError> {
        Ok(self.store.load_secret(path, kind)?.map(SecretBytes::from))
    }
}
