//! DSA signature engine.

use tracing::{debug, info};

use sealdoc_crypto::{signing, DsaSigningKey, DsaVerifyingKey, SecretBytes};

use crate::config::CryptoConfig;
use crate::encoding;
use crate::error::{ConfigError, EngineError};
use crate::traits::CertEngine;

/// Signs the ciphertext string with SHA256withDSA.
///
/// Keys come from the configuration when present. The public key is
/// reconstructed from its stored DER form for each verification.
pub struct DsaCertificate {
    config: CryptoConfig,
    signing_key: Option<DsaSigningKey>,
}

impl DsaCertificate {
    pub(crate) fn new(config: &CryptoConfig) -> Result<Self, EngineError> {
        let signing_key = config
            .signature_private_key
            .as_ref()
            .map(|der| signing::import_private_key(der.as_bytes()))
            .transpose()?;

        Ok(Self {
            config: config.clone(),
            signing_key,
        })
    }

    fn verifying_key(&self) -> Result<DsaVerifyingKey, EngineError> {
        if let Some(encoded) = &self.config.signature_public_key {
            let der = encoding::decode("signature_public_key", encoded)?;
            return Ok(signing::import_public_key(&der)?);
        }
        match &self.signing_key {
            Some(key) => Ok(key.verifying_key().clone()),
            None => Err(ConfigError::MissingField("signature_public_key").into()),
        }
    }
}

impl CertEngine for DsaCertificate {
    fn generate_certs(&mut self) -> Result<CryptoConfig, EngineError> {
        let signing_key = signing::generate_signing_key();
        let public_der = signing::export_public_key(signing_key.verifying_key())?;
        let private_der = signing::export_private_key(&signing_key)?;

        self.config.signature_public_key = Some(encoding::encode(&public_der));
        self.config.signature_private_key = Some(SecretBytes::from(private_der));
        self.config.signature = None;
        self.signing_key = Some(signing_key);

        info!(public_key_len = public_der.len(), "Generated DSA key pair");
        Ok(self.config.clone())
    }

    fn sign(&self, message: &str) -> Result<CryptoConfig, EngineError> {
        let key = self
            .signing_key
            .as_ref()
            .ok_or(ConfigError::MissingField("signature_private_key"))?;
        let signature = signing::sign_sha256(key, message.as_bytes())?;

        debug!(signature_len = signature.len(), "Signed document");

        let mut config = self.config.clone();
        config.signature = Some(encoding::encode(&signature));
        Ok(config)
    }

    fn verify(&self, signature: &str, message: &str) -> Result<bool, EngineError> {
        let key = self.verifying_key()?;
        let Ok(signature) = encoding::decode("signature", signature) else {
            return Ok(false);
        };
        Ok(signing::verify_sha256(&key, message.as_bytes(), &signature))
    }
}
