//! DSA key pairs and SHA256withDSA signatures.
//!
//! Public keys are exchanged as SPKI DER, private keys as PKCS#8 DER,
//! and signatures as the DER `SEQUENCE { r, s }`.

use dsa::{Components, KeySize, Signature, SigningKey, VerifyingKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use signature::{DigestSigner, DigestVerifier, SignatureEncoding};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Domain parameter size for generated keys (1024-bit p, 160-bit q).
#[allow(deprecated)]
pub const DSA_KEY_SIZE: KeySize = KeySize::DSA_1024_160;

/// Generates fresh domain parameters and a key pair.
pub fn generate_signing_key() -> SigningKey {
    let components = Components::generate(&mut OsRng, DSA_KEY_SIZE);
    SigningKey::generate(&mut OsRng, components)
}

/// Encodes a public key as SPKI DER.
pub fn export_public_key(key: &VerifyingKey) -> Result<Vec<u8>, CryptoError> {
    key.to_public_key_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|e| CryptoError::Encoding(format!("public key: {}", e)))
}

/// Encodes a private key as PKCS#8 DER.
pub fn export_private_key(key: &SigningKey) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    key.to_pkcs8_der()
        .map(|doc| Zeroizing::new(doc.as_bytes().to_vec()))
        .map_err(|e| CryptoError::Encoding(format!("private key: {}", e)))
}

/// Decodes an SPKI DER public key.
pub fn import_public_key(der: &[u8]) -> Result<VerifyingKey, CryptoError> {
    VerifyingKey::from_public_key_der(der)
        .map_err(|e| CryptoError::InvalidKey(format!("public key: {}", e)))
}

/// Decodes a PKCS#8 DER private key.
pub fn import_private_key(der: &[u8]) -> Result<SigningKey, CryptoError> {
    SigningKey::from_pkcs8_der(der)
        .map_err(|e| CryptoError::InvalidKey(format!("private key: {}", e)))
}

/// Signs `message` with SHA256withDSA, returning the DER signature.
pub fn sign_sha256(key: &SigningKey, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let signature: Signature = key
        .try_sign_digest(Sha256::new_with_prefix(message))
        .map_err(|e| CryptoError::SignatureFailed(e.to_string()))?;
    Ok(signature.to_bytes().to_vec())
}

/// Verifies a DER SHA256withDSA signature.
///
/// Malformed signatures verify as `false`.
pub fn verify_sha256(key: &VerifyingKey, message: &[u8], signature: &[u8]) -> bool {
    let Ok(signature) = Signature::try_from(signature) else {
        return false;
    };
    key.verify_digest(Sha256::new_with_prefix(message), &signature)
        .is_ok()
}
