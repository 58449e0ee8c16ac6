//! AES block modes.
//!
//! One function pair per mode. Key length selects AES-128, AES-192 or AES-256.
//! ECB, CBC and OFB come from the RustCrypto mode crates, GCM from `aes-gcm`,
//! and CTS is CBC ciphertext stealing (CS3 variant, as in RFC 3962) built on
//! the raw AES block function.

use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::Aead;
use aes_gcm::AesGcm;
use cipher::block_padding::{Pkcs7, ZeroPadding};
use cipher::consts::U16;
use cipher::generic_array::GenericArray;
use cipher::{
    BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut, BlockSizeUser, KeyInit,
    KeyIvInit, StreamCipher,
};

use crate::error::CryptoError;
use crate::symmetric::{PaddingScheme, BLOCK_SIZE, CTS_MIN_INPUT, GCM_IV_SIZE, GCM_TAG_SIZE};

/// GCM with a 16-byte nonce and 128-bit tag.
type Gcm16<C> = AesGcm<C, U16>;

type Block = GenericArray<u8, U16>;

/// Runs `$body` with `$cipher` bound to the AES variant matching the key length.
macro_rules! with_aes {
    ($key:expr, $cipher:ident => $body:expr) => {
        match $key.len() {
            16 => {
                type $cipher = Aes128;
                $body
            },
            24 => {
                type $cipher = Aes192;
                $body
            },
            32 => {
                type $cipher = Aes256;
                $body
            },
            n => Err(CryptoError::InvalidKey(format!(
                "AES key must be 16, 24 or 32 bytes, got {}",
                n
            ))),
        }
    };
}

fn check_iv(iv: &[u8], expected: usize) -> Result<(), CryptoError> {
    if iv.len() != expected {
        return Err(CryptoError::InvalidIv(format!(
            "expected {} bytes, got {}",
            expected,
            iv.len()
        )));
    }
    Ok(())
}

fn check_block_aligned(ciphertext: &[u8]) -> Result<(), CryptoError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::DecryptionFailed(format!(
            "ciphertext length {} is not a positive multiple of {}",
            ciphertext.len(),
            BLOCK_SIZE
        )));
    }
    Ok(())
}

/// Zero padding cannot tell trailing NULs from padding, and pads empty
/// input to nothing. Empty input is sent as one zero block instead.
fn zero_pad_source(plaintext: &[u8]) -> Result<&[u8], CryptoError> {
    const EMPTY_BLOCK: [u8; BLOCK_SIZE] = [0; BLOCK_SIZE];
    match plaintext.last() {
        None => Ok(&EMPTY_BLOCK[..]),
        Some(0) => Err(CryptoError::InvalidInput(
            "zero-byte padding cannot carry trailing NUL bytes".to_string(),
        )),
        Some(_) => Ok(plaintext),
    }
}

fn bad_padding<E>(_: E) -> CryptoError {
    CryptoError::DecryptionFailed("invalid padding".to_string())
}

fn invalid_key(e: cipher::InvalidLength) -> CryptoError {
    CryptoError::InvalidKey(e.to_string())
}

// ============================================================================
// ECB
// ============================================================================

/// Encrypts with AES-ECB and the given padding.
///
/// Zero-byte padding rejects plaintext ending in a NUL byte.
pub fn ecb_encrypt(
    key: &[u8],
    padding: PaddingScheme,
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    with_aes!(key, C => {
        let enc = ecb::Encryptor::<C>::new_from_slice(key).map_err(invalid_key)?;
        Ok(match padding {
            PaddingScheme::Pkcs7 => enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            PaddingScheme::ZeroByte => {
                enc.encrypt_padded_vec_mut::<ZeroPadding>(zero_pad_source(plaintext)?)
            },
        })
    })
}

/// Decrypts AES-ECB and strips the given padding.
pub fn ecb_decrypt(
    key: &[u8],
    padding: PaddingScheme,
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    check_block_aligned(ciphertext)?;
    with_aes!(key, C => {
        let dec = ecb::Decryptor::<C>::new_from_slice(key).map_err(invalid_key)?;
        let plaintext = match padding {
            PaddingScheme::Pkcs7 => dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            PaddingScheme::ZeroByte => dec.decrypt_padded_vec_mut::<ZeroPadding>(ciphertext),
        };
        plaintext.map_err(bad_padding)
    })
}

// ============================================================================
// CBC
// ============================================================================

/// Encrypts with AES-CBC and the given padding.
pub fn cbc_encrypt(
    key: &[u8],
    iv: &[u8],
    padding: PaddingScheme,
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    check_iv(iv, BLOCK_SIZE)?;
    with_aes!(key, C => {
        let enc = cbc::Encryptor::<C>::new_from_slices(key, iv).map_err(invalid_key)?;
        Ok(match padding {
            PaddingScheme::Pkcs7 => enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            PaddingScheme::ZeroByte => {
                enc.encrypt_padded_vec_mut::<ZeroPadding>(zero_pad_source(plaintext)?)
            },
        })
    })
}

/// Decrypts AES-CBC and strips the given padding.
pub fn cbc_decrypt(
    key: &[u8],
    iv: &[u8],
    padding: PaddingScheme,
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    check_iv(iv, BLOCK_SIZE)?;
    check_block_aligned(ciphertext)?;
    with_aes!(key, C => {
        let dec = cbc::Decryptor::<C>::new_from_slices(key, iv).map_err(invalid_key)?;
        let plaintext = match padding {
            PaddingScheme::Pkcs7 => dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            PaddingScheme::ZeroByte => dec.decrypt_padded_vec_mut::<ZeroPadding>(ciphertext),
        };
        plaintext.map_err(bad_padding)
    })
}

// ============================================================================
// CTS (CBC-CS3)
// ============================================================================

fn check_cts_len(len: usize) -> Result<(), CryptoError> {
    if len < CTS_MIN_INPUT {
        return Err(CryptoError::InputTooShort {
            required: CTS_MIN_INPUT,
            actual: len,
        });
    }
    Ok(())
}

fn xor_block(a: &Block, b: &[u8]) -> Block {
    let mut out = a.clone();
    for (o, x) in out.iter_mut().zip(b) {
        *o ^= x;
    }
    out
}

/// Encrypts with AES-CBC ciphertext stealing. Input must span two blocks.
pub fn cts_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_cts_len(plaintext.len())?;
    check_iv(iv, BLOCK_SIZE)?;
    with_aes!(key, C => {
        let cipher = C::new_from_slice(key).map_err(invalid_key)?;
        Ok(cs3_encrypt(&cipher, iv, plaintext))
    })
}

/// Decrypts AES-CBC ciphertext stealing. Input must span two blocks.
pub fn cts_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_cts_len(ciphertext.len())?;
    check_iv(iv, BLOCK_SIZE)?;
    with_aes!(key, C => {
        let cipher = C::new_from_slice(key).map_err(invalid_key)?;
        Ok(cs3_decrypt(&cipher, iv, ciphertext))
    })
}

fn cs3_encrypt<C>(cipher: &C, iv: &[u8], data: &[u8]) -> Vec<u8>
where
    C: BlockEncrypt + BlockSizeUser<BlockSize = U16>,
{
    let blocks = data.len().div_ceil(BLOCK_SIZE);
    let head = (blocks - 1) * BLOCK_SIZE;
    let tail = data.len() - head;

    let mut out = Vec::with_capacity(data.len());
    let mut prev = Block::clone_from_slice(iv);
    for chunk in data[..head].chunks_exact(BLOCK_SIZE) {
        let mut block = xor_block(&prev, chunk);
        cipher.encrypt_block(&mut block);
        out.extend_from_slice(&block);
        prev = block;
    }

    // Zero-pad the final block, chain it, then swap it in front of the
    // truncated penultimate block.
    let mut last = Block::default();
    last[..tail].copy_from_slice(&data[head..]);
    let mut last = xor_block(&prev, &last);
    cipher.encrypt_block(&mut last);

    out.truncate(head - BLOCK_SIZE);
    out.extend_from_slice(&last);
    out.extend_from_slice(&prev[..tail]);
    out
}

fn cs3_decrypt<C>(cipher: &C, iv: &[u8], data: &[u8]) -> Vec<u8>
where
    C: BlockDecrypt + BlockSizeUser<BlockSize = U16>,
{
    let blocks = data.len().div_ceil(BLOCK_SIZE);
    let head = (blocks - 1) * BLOCK_SIZE;
    let tail = data.len() - head;

    let mut out = Vec::with_capacity(data.len());
    let mut prev = Block::clone_from_slice(iv);
    for chunk in data[..head - BLOCK_SIZE].chunks_exact(BLOCK_SIZE) {
        let current = Block::clone_from_slice(chunk);
        let mut block = current.clone();
        cipher.decrypt_block(&mut block);
        out.extend_from_slice(&xor_block(&prev, &block));
        prev = current;
    }

    let stolen = &data[head..];
    let mut mixed = Block::clone_from_slice(&data[head - BLOCK_SIZE..head]);
    cipher.decrypt_block(&mut mixed);

    // The bytes past `tail` in `mixed` are the stolen tail of the
    // penultimate ciphertext block.
    let mut penultimate = mixed.clone();
    penultimate[..tail].copy_from_slice(stolen);

    let final_plain: Vec<u8> = mixed[..tail]
        .iter()
        .zip(stolen)
        .map(|(m, s)| m ^ s)
        .collect();

    let mut block = penultimate;
    cipher.decrypt_block(&mut block);
    out.extend_from_slice(&xor_block(&prev, &block));
    out.extend_from_slice(&final_plain);
    out
}

// ============================================================================
// OFB
// ============================================================================

/// Applies the AES-OFB keystream. Encryption and decryption are the same operation.
pub fn ofb_apply(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_iv(iv, BLOCK_SIZE)?;
    with_aes!(key, C => {
        let mut ofb = ofb::Ofb::<C>::new_from_slices(key, iv).map_err(invalid_key)?;
        let mut buf = data.to_vec();
        ofb.apply_keystream(&mut buf);
        Ok(buf)
    })
}

// ============================================================================
// GCM
// ============================================================================

/// Encrypts with AES-GCM (16-byte IV). Output is `ciphertext || tag`.
pub fn gcm_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_iv(iv, GCM_IV_SIZE)?;
    with_aes!(key, C => {
        let gcm = Gcm16::<C>::new_from_slice(key).map_err(invalid_key)?;
        gcm.encrypt(GenericArray::from_slice(iv), plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    })
}

/// Decrypts AES-GCM, verifying the 128-bit tag.
///
/// A tag mismatch is reported as [`CryptoError::AuthenticationFailed`].
pub fn gcm_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_iv(iv, GCM_IV_SIZE)?;
    if ciphertext.len() < GCM_TAG_SIZE {
        return Err(CryptoError::DecryptionFailed(
            "ciphertext shorter than authentication tag".to_string(),
        ));
    }
    with_aes!(key, C => {
        let gcm = Gcm16::<C>::new_from_slice(key).map_err(invalid_key)?;
        gcm.decrypt(GenericArray::from_slice(iv), ciphertext)
            .map_err(|_| CryptoError::AuthenticationFailed)
    })
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::random::{generate_iv, generate_key};

    const MESSAGE: &[u8] = b"The quick brown fox jumps over the lazy dog";

    #[test]
    fn test_ecb_fips197_vector() {
        let key = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let plaintext = hex::decode("00112233445566778899aabbccddeeff").unwrap();

        let ciphertext = ecb_encrypt(&key, PaddingScheme::Pkcs7, &plaintext).unwrap();

        // One full block of PKCS#7 padding follows the data block.
        assert_eq!(ciphertext.len(), 32);
        assert_eq!(
            hex::encode(&ciphertext[..16]),
            "69c4e0d86a7b0430d8cdb78070b4c55a"
        );
        let decrypted = ecb_decrypt(&key, PaddingScheme::Pkcs7, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_ecb_cbc_roundtrip_all_key_sizes() {
        for len in [16, 24, 32] {
            let key = generate_key(len);
            let iv = generate_iv();
            for padding in [PaddingScheme::Pkcs7, PaddingScheme::ZeroByte] {
                let ct = ecb_encrypt(&key, padding, MESSAGE).unwrap();
                assert_eq!(ecb_decrypt(&key, padding, &ct).unwrap(), MESSAGE);

                let ct = cbc_encrypt(&key, &iv, padding, MESSAGE).unwrap();
                assert_eq!(ct.len() % BLOCK_SIZE, 0);
                assert_eq!(cbc_decrypt(&key, &iv, padding, &ct).unwrap(), MESSAGE);
            }
        }
    }

    #[test]
    fn test_zero_padding_empty_input_is_one_block() {
        let key = generate_key(16);
        let iv = generate_iv();

        let ct = ecb_encrypt(&key, PaddingScheme::ZeroByte, b"").unwrap();
        assert_eq!(ct.len(), BLOCK_SIZE);
        assert!(ecb_decrypt(&key, PaddingScheme::ZeroByte, &ct).unwrap().is_empty());

        let ct = cbc_encrypt(&key, &iv, PaddingScheme::ZeroByte, b"").unwrap();
        assert_eq!(ct.len(), BLOCK_SIZE);
        assert!(cbc_decrypt(&key, &iv, PaddingScheme::ZeroByte, &ct).unwrap().is_empty());
    }

    #[test]
    fn test_zero_padding_rejects_trailing_nul() {
        let key = generate_key(16);
        let iv = generate_iv();

        assert!(matches!(
            ecb_encrypt(&key, PaddingScheme::ZeroByte, b"abc\0"),
            Err(CryptoError::InvalidInput(_))
        ));
        assert!(matches!(
            cbc_encrypt(&key, &iv, PaddingScheme::ZeroByte, b"abc\0"),
            Err(CryptoError::InvalidInput(_))
        ));

        // Inner NULs are data, not padding.
        let ct = cbc_encrypt(&key, &iv, PaddingScheme::ZeroByte, b"a\0b").unwrap();
        assert_eq!(cbc_decrypt(&key, &iv, PaddingScheme::ZeroByte, &ct).unwrap(), b"a\0b");
    }

    #[test]
    fn test_block_aligned_input_roundtrips() {
        let key = generate_key(16);
        let iv = generate_iv();
        let plaintext = [b'x'; 2 * BLOCK_SIZE];

        for padding in [PaddingScheme::Pkcs7, PaddingScheme::ZeroByte] {
            let ct = cbc_encrypt(&key, &iv, padding, &plaintext).unwrap();
            assert_eq!(cbc_decrypt(&key, &iv, padding, &ct).unwrap(), plaintext);
            let ct = ecb_encrypt(&key, padding, &plaintext).unwrap();
            assert_eq!(ecb_decrypt(&key, padding, &ct).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_cbc_wrong_key_fails_or_differs() {
        let key = generate_key(16);
        let other = generate_key(16);
        let iv = generate_iv();

        let ct = cbc_encrypt(&key, &iv, PaddingScheme::Pkcs7, MESSAGE).unwrap();
        match cbc_decrypt(&other, &iv, PaddingScheme::Pkcs7, &ct) {
            Err(CryptoError::DecryptionFailed(_)) => {},
            Ok(garbage) => assert_ne!(garbage, MESSAGE),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_cbc_truncated_ciphertext_fails() {
        let key = generate_key(16);
        let iv = generate_iv();
        let ct = cbc_encrypt(&key, &iv, PaddingScheme::Pkcs7, MESSAGE).unwrap();

        let result = cbc_decrypt(&key, &iv, PaddingScheme::Pkcs7, &ct[..ct.len() - 3]);
        assert!(matches!(result, Err(CryptoError::DecryptionFailed(_))));
    }

    #[test]
    fn test_invalid_key_and_iv_lengths() {
        let iv = generate_iv();
        let result = cbc_encrypt(&[0u8; 20], &iv, PaddingScheme::Pkcs7, MESSAGE);
        assert!(matches!(result, Err(CryptoError::InvalidKey(_))));

        let result = cbc_encrypt(&[0u8; 16], &iv[..8], PaddingScheme::Pkcs7, MESSAGE);
        assert!(matches!(result, Err(CryptoError::InvalidIv(_))));
    }

    #[test]
    fn test_cts_roundtrip_various_lengths() {
        let key = generate_key(32);
        let iv = generate_iv();
        for len in [32, 33, 40, 47, 48, 64, 100] {
            let plaintext: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let ct = cts_encrypt(&key, &iv, &plaintext).unwrap();
            assert_eq!(ct.len(), len, "ciphertext stealing must not expand");
            assert_eq!(cts_decrypt(&key, &iv, &ct).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_cts_swaps_last_blocks_of_cbc() {
        let key = generate_key(16);
        let iv = generate_iv();
        let plaintext = [0x5au8; 48];

        let cbc = {
            let enc = cbc::Encryptor::<Aes128>::new_from_slices(&key, &iv).unwrap();
            enc.encrypt_padded_vec_mut::<cipher::block_padding::NoPadding>(&plaintext)
        };
        let cts = cts_encrypt(&key, &iv, &plaintext).unwrap();

        assert_eq!(&cts[..16], &cbc[..16]);
        assert_eq!(&cts[16..32], &cbc[32..48]);
        assert_eq!(&cts[32..48], &cbc[16..32]);
    }

    #[test]
    fn test_cts_rejects_short_input() {
        let key = generate_key(16);
        let iv = generate_iv();

        for len in [0, 10, 16, 31] {
            let result = cts_encrypt(&key, &iv, &vec![b'a'; len]);
            assert!(
                matches!(result, Err(CryptoError::InputTooShort { required: 32, actual }) if actual == len)
            );
        }
        let result = cts_decrypt(&key, &iv, &[0u8; 20]);
        assert!(matches!(result, Err(CryptoError::InputTooShort { .. })));
    }

    #[test]
    fn test_ofb_roundtrip_keeps_length() {
        let key = generate_key(24);
        let iv = generate_iv();

        let ct = ofb_apply(&key, &iv, MESSAGE).unwrap();
        assert_eq!(ct.len(), MESSAGE.len());
        assert_ne!(ct, MESSAGE);
        assert_eq!(ofb_apply(&key, &iv, &ct).unwrap(), MESSAGE);
    }

    #[test]
    fn test_gcm_roundtrip_and_format() {
        let key = generate_key(32);
        let iv = generate_iv();

        let ct = gcm_encrypt(&key, &iv, MESSAGE).unwrap();
        assert_eq!(ct.len(), MESSAGE.len() + GCM_TAG_SIZE);
        assert_eq!(gcm_decrypt(&key, &iv, &ct).unwrap(), MESSAGE);
    }

    #[test]
    fn test_gcm_tampering_is_authentication_failure() {
        let key = generate_key(16);
        let iv = generate_iv();
        let ct = gcm_encrypt(&key, &iv, MESSAGE).unwrap();

        let mut body = ct.clone();
        body[0] ^= 0x01;
        assert!(matches!(
            gcm_decrypt(&key, &iv, &body),
            Err(CryptoError::AuthenticationFailed)
        ));

        let mut tag = ct.clone();
        let last = tag.len() - 1;
        tag[last] ^= 0x80;
        assert!(matches!(
            gcm_decrypt(&key, &iv, &tag),
            Err(CryptoError::AuthenticationFailed)
        ));

        let other = generate_key(16);
        assert!(matches!(
            gcm_decrypt(&other, &iv, &ct),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_gcm_rejects_12_byte_iv() {
        let key = generate_key(32);
        let result = gcm_encrypt(&key, &[0u8; 12], MESSAGE);
        assert!(matches!(result, Err(CryptoError::InvalidIv(_))));
    }
}
