//! # SealDoc Crypto
//!
//! Cryptographic primitives for SealDoc.
//!
//! This crate wraps the RustCrypto implementations behind small byte-oriented
//! functions:
//! - Symmetric encryption: AES in ECB/CBC/CTS/OFB/GCM, and RC4
//! - Key derivation (PBKDF2, scrypt)
//! - Integrity tags (SHA-256, AES-CMAC, HMAC-SHA256)
//! - Digital signatures (SHA256withDSA)
//! - Secure random generation and zeroizing secret containers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod block;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod mac;
pub mod random;
pub mod signing;
pub mod stream;
pub mod symmetric;

pub use dsa::{SigningKey as DsaSigningKey, VerifyingKey as DsaVerifyingKey};
pub use error::CryptoError;
pub use keys::SecretBytes;
pub use symmetric::{ModeStrategy, PaddingScheme};
