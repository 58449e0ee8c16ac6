//! Secret byte containers with automatic memory zeroization.
//!
//! All secret material (symmetric keys, MAC keys, private keys, passwords)
//! travels through the engine in a [`SecretBytes`], which is erased from
//! memory when dropped and never printed by `Debug`.

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;
use crate::random::generate_key;

/// Variable-length secret bytes with automatic zeroization.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes {
    bytes: Vec<u8>,
}

impl SecretBytes {
    /// Generates `len` random secret bytes.
    pub fn generate(len: usize) -> Self {
        let key = generate_key(len);
        Self {
            bytes: key.to_vec(),
        }
    }

    /// Copies secret bytes from a slice.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Copies secret bytes from a slice, requiring an exact length.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly `len` bytes.
    pub fn with_len(bytes: &[u8], len: usize) -> Result<Self, CryptoError> {
        if bytes.len() != len {
            return Err(CryptoError::InvalidKey(format!(
                "expected {} bytes, got {}",
                len,
                bytes.len()
            )));
        }
        Ok(Self::from_slice(bytes))
    }

    /// Returns the raw secret bytes.
    ///
    /// Use with caution - copies made from the returned slice are not zeroized.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the number of secret bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true when no bytes are held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for SecretBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<Zeroizing<Vec<u8>>> for SecretBytes {
    fn from(bytes: Zeroizing<Vec<u8>>) -> Self {
        Self::from_slice(&bytes)
    }
}

impl From<&str> for SecretBytes {
    fn from(text: &str) -> Self {
        Self::from_slice(text.as_bytes())
    }
}

impl PartialEq for SecretBytes {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.as_slice().ct_eq(other.bytes.as_slice()).into()
    }
}

impl Eq for SecretBytes {}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBytes")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
