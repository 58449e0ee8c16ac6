//! Message digests and MACs used for document integrity.
//!
//! SHA-256 (keyless), AES-CMAC and HMAC-SHA256. Tags are compared in
//! constant time with [`tags_match`].

use aes::{Aes128, Aes192, Aes256};
use cmac::Cmac;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Generated AES-CMAC key size in bytes.
pub const CMAC_KEY_SIZE: usize = 16;

/// Generated HMAC-SHA256 key size in bytes.
pub const HMAC_KEY_SIZE: usize = 32;

/// Computes SHA-256 over `message`.
pub fn sha256(message: &[u8]) -> Vec<u8> {
    Sha256::digest(message).to_vec()
}

/// Computes AES-CMAC over `message`. The key length selects the AES variant.
pub fn aes_cmac(key: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    fn run<M: Mac + hmac::digest::KeyInit>(key: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut mac = <M as Mac>::new_from_slice(key)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    match key.len() {
        16 => run::<Cmac<Aes128>>(key, message),
        24 => run::<Cmac<Aes192>>(key, message),
        32 => run::<Cmac<Aes256>>(key, message),
        n => Err(CryptoError::InvalidKey(format!(
            "AES-CMAC key must be 16, 24 or 32 bytes, got {}",
            n
        ))),
    }
}

/// Computes HMAC-SHA256 over `message`.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Compares two tags in constant time. Tags of different length never match.
pub fn tags_match(expected: &[u8], actual: &[u8]) -> bool {
    expected.ct_eq(actual).into()
}
