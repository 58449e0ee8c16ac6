//! Mode strategies for symmetric encryption.
//!
//! A [`ModeStrategy`] is the resolved `(algorithm, mode, padding)` triple. Each
//! variant delegates to one isolated function pair in [`crate::block`] or
//! [`crate::stream`], so adding a mode touches only its own arm.

use crate::block;
use crate::error::CryptoError;
use crate::stream;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// GCM IV size used by the engine, in bytes.
pub const GCM_IV_SIZE: usize = 16;

/// GCM authentication tag size in bytes (128 bits).
pub const GCM_TAG_SIZE: usize = 16;

/// Ciphertext stealing needs at least two full blocks of input.
pub const CTS_MIN_INPUT: usize = 2 * BLOCK_SIZE;

/// Padding schemes for ECB and CBC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingScheme {
    /// PKCS#7.
    Pkcs7,
    /// Zero bytes up to the block boundary.
    ZeroByte,
}

/// Encryption strategy selected from algorithm, block mode and padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeStrategy {
    /// RC4 stream cipher, no IV.
    Rc4,
    /// AES-ECB with padding, no IV.
    Ecb(PaddingScheme),
    /// AES-CBC with padding.
    Cbc(PaddingScheme),
    /// AES-CBC with ciphertext stealing.
    Cts,
    /// AES-OFB keystream.
    Ofb,
    /// AES-GCM authenticated encryption.
    Gcm,
}

impl ModeStrategy {
    /// Length of the IV this strategy needs, if any.
    pub fn iv_len(&self) -> Option<usize> {
        match self {
            Self::Rc4 | Self::Ecb(_) => None,
            Self::Cbc(_) | Self::Cts | Self::Ofb => Some(BLOCK_SIZE),
            Self::Gcm => Some(GCM_IV_SIZE),
        }
    }

    /// Encrypts `plaintext`. `iv` is ignored by strategies without an IV.
    pub fn encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match *self {
            Self::Rc4 => stream::rc4_apply(key, plaintext),
            Self::Ecb(padding) => block::ecb_encrypt(key, padding, plaintext),
            Self::Cbc(padding) => block::cbc_encrypt(key, iv, padding, plaintext),
            Self::Cts => block::cts_encrypt(key, iv, plaintext),
            Self::Ofb => block::ofb_apply(key, iv, plaintext),
            Self::Gcm => block::gcm_encrypt(key, iv, plaintext),
        }
    }

    /// Decrypts `ciphertext`. `iv` is ignored by strategies without an IV.
    pub fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match *self {
            Self::Rc4 => stream::rc4_apply(key, ciphertext),
            Self::Ecb(padding) => block::ecb_decrypt(key, padding, ciphertext),
            Self::Cbc(padding) => block::cbc_decrypt(key, iv, padding, ciphertext),
            Self::Cts => block::cts_decrypt(key, iv, ciphertext),
            Self::Ofb => block::ofb_apply(key, iv, ciphertext),
            Self::Gcm => block::gcm_decrypt(key, iv, ciphertext),
        }
    }
}
