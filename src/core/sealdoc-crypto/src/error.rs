//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key generation failed.
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (bad padding, malformed ciphertext, wrong key).
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// Authenticated decryption rejected the tag.
    #[error("integrity check failed: authentication tag mismatch")]
    AuthenticationFailed,

    /// Input is shorter than the mode can process.
    #[error("input too short: need at least {required} bytes, got {actual}")]
    InputTooShort {
        /// Minimum accepted length in bytes.
        required: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// Signature creation failed.
    #[error("signature creation failed: {0}")]
    SignatureFailed(String),

    /// Invalid key format or size.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Invalid initialization vector.
    #[error("invalid iv: {0}")]
    InvalidIv(String),

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Recovered plaintext is not valid UTF-8.
    #[error("recovered plaintext is not valid utf-8")]
    InvalidUtf8,

    /// Key or signature encoding failed.
    #[error("encoding error: {0}")]
    Encoding(String),
}
