//! # SealDoc Storage
//!
//! Persistence for protected documents.
//!
//! A document lives next to its secrets: the configuration record is
//! written to `<path>.ste` and each secret to its own sidecar
//! (`<path>.key`, `<path>.digKey`, `<path>.privKey`, `<path>.pubKey`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod file;

pub use backend::{DocumentStore, SecretKind, RECORD_EXTENSION};
pub use error::StorageError;
pub use file::FileStore;
