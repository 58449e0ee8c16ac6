//! RC4 stream cipher.
//!
//! RC4 is only offered for compatibility with legacy documents. Key lengths
//! are limited to the sizes the engine can select.

use cipher::consts::{U128, U16, U256, U32, U5, U64};
use cipher::{KeyInit, StreamCipher};
use rc4::Rc4;

use crate::error::CryptoError;

/// Supported RC4 key lengths in bytes (40 to 2048 bits).
pub const RC4_KEY_LENGTHS: [usize; 6] = [5, 16, 32, 64, 128, 256];

/// Applies the RC4 keystream to `data`. Encryption and decryption are the same operation.
pub fn rc4_apply(key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut buf = data.to_vec();

    macro_rules! apply {
        ($size:ty) => {{
            let mut rc4 = Rc4::<$size>::new_from_slice(key)
                .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
            rc4.apply_keystream(&mut buf);
        }};
    }

    match key.len() {
        5 => apply!(U5),
        16 => apply!(U16),
        32 => apply!(U32),
        64 => apply!(U64),
        128 => apply!(U128),
        256 => apply!(U256),
        n => {
            return Err(CryptoError::InvalidKey(format!(
                "unsupported RC4 key length: {} bytes",
                n
            )))
        },
    }

    Ok(buf)
}
