//! Engine interfaces handed out by the factory.
//!
//! Every engine reads the [`CryptoConfig`] it was built from and returns a
//! new config carrying its output; the input record is never mutated.

use crate::config::CryptoConfig;
use crate::error::EngineError;

/// Symmetric encryption of document text.
pub trait CipherEngine: Send {
    /// Encrypts `plaintext`, returning a config with `cipher_text`, `key`
    /// and (when the mode uses one) `iv_or_salt` populated.
    fn encrypt(&self, plaintext: &str) -> Result<CryptoConfig, EngineError>;

    /// Decrypts base64 `cipher_text` back to text.
    fn decrypt(&self, cipher_text: &str) -> Result<String, EngineError>;
}

/// Password-based key derivation.
pub trait PbeEngine: Send {
    /// Derives the cipher key from the password and salt, returning a
    /// config with `key` and `iv_or_salt` populated.
    fn derive_key(&self) -> Result<CryptoConfig, EngineError>;
}

/// Hash or MAC integrity tags.
pub trait DigestEngine: Send {
    /// Computes the tag over `message`, returning a config with `signature`
    /// (and `digest_key` for MACs) populated.
    fn sign(&self, message: &str) -> Result<CryptoConfig, EngineError>;

    /// Checks a base64 tag. Undecodable tags verify as `false`.
    fn verify(&self, signature: &str, message: &str) -> Result<bool, EngineError>;
}

/// DSA signatures.
pub trait CertEngine: Send {
    /// Generates a fresh key pair and clears any previous signature.
    fn generate_certs(&mut self) -> Result<CryptoConfig, EngineError>;

    /// Signs `message`, returning a config with `signature` populated.
    fn sign(&self, message: &str) -> Result<CryptoConfig, EngineError>;

    /// Checks a base64 signature. Malformed signatures verify as `false`.
    fn verify(&self, signature: &str, message: &str) -> Result<bool, EngineError>;
}
