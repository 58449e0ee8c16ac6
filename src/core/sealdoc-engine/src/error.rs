//! Engine error types.

use thiserror::Error;

use crate::config::IntegrityKind;

/// Configuration errors, raised before any primitive is invoked.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The feature required by the requested engine is switched off.
    #[error("{0} is not active")]
    Inactive(&'static str),

    /// A field the operation depends on is absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A value is not legal in combination with the rest of the configuration.
    #[error("unsupported {field}: {value}")]
    Unsupported {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// The engine requested does not match the configured integrity mechanism.
    #[error("integrity kind is {actual}, expected {expected}")]
    WrongIntegrityKind {
        /// Kind the engine needs.
        expected: IntegrityKind,
        /// Kind that is configured.
        actual: IntegrityKind,
    },

    /// A value could not be parsed or has the wrong shape.
    #[error("invalid {field}: {value}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// Feature toggles contradict each other.
    #[error("inconsistent configuration: {0}")]
    Inconsistent(String),
}

/// Errors that can occur while running an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Cryptographic operation error.
    #[error("crypto error: {0}")]
    Crypto(#[from] sealdoc_crypto::CryptoError),

    /// Stored base64 could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl EngineError {
    /// Returns true when a GCM tag check rejected the ciphertext.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            EngineError::Crypto(sealdoc_crypto::CryptoError::AuthenticationFailed)
        )
    }
}

/// Errors raised by the save/load pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Engine error.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] sealdoc_storage::StorageError),
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::Engine(EngineError::Config(e))
    }
}
