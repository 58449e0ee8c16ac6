//! # SealDoc Engine
//!
//! Configuration-driven document protection.
//!
//! ## Overview
//!
//! A [`CryptoConfig`] describes how a document is protected: whether it is
//! encrypted and with which cipher, mode and padding, whether the key comes
//! from a password, and whether the ciphertext carries a hash, MAC or DSA
//! signature. The engine factory hands out one engine per concern, each
//! bound to a copy of the configuration:
//!
//! - [`create_cipher`]: AES (ECB, CBC, CTS, OFB, GCM) or RC4
//! - [`create_pbe`]: PBKDF2 or scrypt key derivation
//! - [`create_digest`]: SHA-256, AES-CMAC or HMAC-SHA256 tags
//! - [`create_cert`]: SHA256withDSA signatures
//!
//! [`Pipeline`] chains them into the save and load sequences and persists
//! the result through a [`sealdoc_storage::DocumentStore`].
//!
//! ## Example
//!
//! ```no_run
//! use sealdoc_engine::{protect, unprotect, CryptoConfig, IntegrityStatus};
//!
//! let mut config = CryptoConfig::new();
//! config.set_integrity_active(true);
//!
//! let protected = protect(config, "Hallo Welt").unwrap();
//! let report = unprotect(&protected).unwrap();
//! assert_eq!(report.integrity, IntegrityStatus::Verified);
//! assert_eq!(report.plaintext.unwrap(), "Hallo Welt");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cert;
pub mod cipher;
pub mod config;
pub mod digest;
mod encoding;
pub mod error;
pub mod factory;
pub mod pbe;
pub mod pipeline;
pub mod traits;

pub use config::{
    BlockMode, CipherAlgorithm, CryptoConfig, IntegrityKind, IntegrityOption, OptionSet, Padding,
    PbeAlgorithm, PbeDigest,
};
pub use error::{ConfigError, EngineError, PipelineError};
pub use factory::{create_cert, create_cipher, create_digest, create_pbe};
pub use pipeline::{protect, unprotect, IntegrityStatus, LoadReport, Pipeline};
pub use traits::{CertEngine, CipherEngine, DigestEngine, PbeEngine};
