//! Document store trait definition.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::Zeroizing;

use crate::error::StorageError;

/// Extension of the configuration record file.
pub const RECORD_EXTENSION: &str = "ste";

/// Secret material stored beside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    /// Symmetric cipher key.
    Key,
    /// MAC key.
    DigestKey,
    /// DSA private key (PKCS#8 DER).
    PrivateKey,
    /// DSA public key (SPKI DER).
    PublicKey,
}

impl SecretKind {
    /// File extension of the sidecar.
    pub fn extension(&self) -> &'static str {
        match self {
            SecretKind::Key => "key",
            SecretKind::DigestKey => "digKey",
            SecretKind::PrivateKey => "privKey",
            SecretKind::PublicKey => "pubKey",
        }
    }
}

impl std::fmt::Display for SecretKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Storage for document records and their secret sidecars.
///
/// `path` names the document; implementations derive the record and
/// sidecar locations from it.
pub trait DocumentStore: Send + Sync {
    /// Writes the record.
    fn save_record<T: Serialize>(&self, path: &Path, record: &T) -> Result<(), StorageError>;

    /// Reads the record. Fails with [`StorageError::NotFound`] when absent.
    fn load_record<T: DeserializeOwned>(&self, path: &Path) -> Result<T, StorageError>;

    /// Writes one secret.
    fn save_secret(&self, path: &Path, kind: SecretKind, secret: &[u8]) -> Result<(), StorageError>;

    /// Reads one secret. An absent sidecar is `Ok(None)`.
    fn load_secret(
        &self,
        path: &Path,
        kind: SecretKind,
    ) -> Result<Option<Zeroizing<Vec<u8>>>, StorageError>;

    /// Deletes one secret. Deleting an absent sidecar succeeds.
    fn remove_secret(&self, path: &Path, kind: SecretKind) -> Result<(), StorageError>;

    /// Writes a record together with its secrets.
    ///
    /// `secrets` names each kind once; `None` removes that sidecar. The
    /// default writes the sidecars and then the record. Backends that can
    /// stage writes should keep the previous sidecars until the record is
    /// in place.
    fn save_document<T: Serialize>(
        &self,
        path: &Path,
        record: &T,
        secrets: &[(SecretKind, Option<&[u8]>)],
    ) -> Result<(), StorageError> {
        for (kind, secret) in secrets {
            match secret {
                Some(bytes) => self.save_secret(path, *kind, bytes)?,
                None => self.remove_secret(path, *kind)?,
            }
        }
        self.save_record(path, record)
    }
}
