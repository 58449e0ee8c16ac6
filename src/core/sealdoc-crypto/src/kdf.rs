//! Password-based key derivation functions.
//!
//! Provides PBKDF2 (HMAC-SHA1 or HMAC-SHA256) and scrypt with the fixed
//! parameters used for every SealDoc document. Both are deterministic in
//! `(password, salt)`; changing these constants breaks existing documents.

use pbkdf2::pbkdf2_hmac;
use scrypt::Params;
use sha1::Sha1;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 128;

/// scrypt cost parameter as log2(N); N = 8.
pub const SCRYPT_LOG_N: u8 = 3;

/// scrypt block size parameter r.
pub const SCRYPT_R: u32 = 128;

/// scrypt parallelization parameter p.
pub const SCRYPT_P: u32 = 8;

/// PRF used by PBKDF2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pbkdf2Hash {
    /// HMAC-SHA1.
    Sha1,
    /// HMAC-SHA256.
    Sha256,
}

/// Derives `key_len` bytes with PBKDF2.
///
/// # Arguments
///
/// * `password` - User password bytes
/// * `salt` - Salt stored alongside the document
/// * `hash` - PRF digest
/// * `key_len` - Output length in bytes
pub fn pbkdf2_derive(
    password: &[u8],
    salt: &[u8],
    hash: Pbkdf2Hash,
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    pbkdf2_with_iterations(password, salt, hash, PBKDF2_ITERATIONS, key_len)
}

fn pbkdf2_with_iterations(
    password: &[u8],
    salt: &[u8],
    hash: Pbkdf2Hash,
    iterations: u32,
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if key_len == 0 {
        return Err(CryptoError::InvalidInput(
            "output length must be > 0".to_string(),
        ));
    }

    let mut out = Zeroizing::new(vec![0u8; key_len]);
    match hash {
        Pbkdf2Hash::Sha1 => pbkdf2_hmac::<Sha1>(password, salt, iterations, &mut out),
        Pbkdf2Hash::Sha256 => pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out),
    }
    Ok(out)
}

/// Derives `key_len` bytes with scrypt (N = 8, r = 128, p = 8).
pub fn scrypt_derive(
    password: &[u8],
    salt: &[u8],
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    scrypt_with_params(password, salt, SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, key_len)
}

fn scrypt_with_params(
    password: &[u8],
    salt: &[u8],
    log_n: u8,
    r: u32,
    p: u32,
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let params = Params::new(log_n, r, p, key_len)
        .map_err(|e| CryptoError::InvalidInput(format!("scrypt parameters: {}", e)))?;

    let mut out = Zeroizing::new(vec![0u8; key_len]);
    scrypt::scrypt(password, salt, &params, &mut out)
        .map_err(|e| CryptoError::KeyGenerationFailed(format!("scrypt: {}", e)))?;
    Ok(out)
}
