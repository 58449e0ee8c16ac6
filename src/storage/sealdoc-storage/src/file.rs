//! Filesystem document store.

use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::backend::{DocumentStore, SecretKind, RECORD_EXTENSION};
use crate::error::StorageError;

/// Stores records as pretty JSON and secrets as base64 text files.
///
/// Relative document paths resolve against the store's base directory.
/// Files are written to a temporary sibling and renamed into place.
#[derive(Debug, Clone)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `base`.
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }

    /// Location of the record for `path`.
    pub fn record_path(&self, path: &Path) -> PathBuf {
        self.file_path(path, RECORD_EXTENSION)
    }

    /// Location of the `kind` sidecar for `path`.
    pub fn secret_path(&self, path: &Path, kind: SecretKind) -> PathBuf {
        self.file_path(path, kind.extension())
    }

    fn file_path(&self, path: &Path, extension: &str) -> PathBuf {
        // Appended rather than replaced, so `notes.txt` maps to `notes.txt.ste`.
        let mut name: OsString = self.base.join(path).into_os_string();
        name.push(".");
        name.push(extension);
        PathBuf::from(name)
    }

    fn write_atomic(target: &Path, contents: &[u8], private: bool) -> Result<(), StorageError> {
        let tmp = Self::write_staged(target, contents, private)?;
        Self::commit(&tmp, target)
    }

    /// Writes `contents` to a temporary sibling of `target` and returns its path.
    fn write_staged(target: &Path, contents: &[u8], private: bool) -> Result<PathBuf, StorageError> {
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
            }
        }

        let mut tmp_name = target.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        if private {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        #[cfg(not(unix))]
        let _ = private;

        let mut file = options.open(&tmp).map_err(|e| io_error(&tmp, e))?;
        file.write_all(contents).map_err(|e| io_error(&tmp, e))?;
        file.sync_all().map_err(|e| io_error(&tmp, e))?;
        Ok(tmp)
    }

    fn commit(tmp: &Path, target: &Path) -> Result<(), StorageError> {
        fs::rename(tmp, target).map_err(|e| {
            let _ = fs::remove_file(tmp);
            io_error(target, e)
        })
    }

    fn stage_secrets(
        &self,
        path: &Path,
        secrets: &[(SecretKind, Option<&[u8]>)],
        staged: &mut Vec<(PathBuf, PathBuf)>,
    ) -> Result<(), StorageError> {
        for (kind, secret) in secrets {
            if let Some(bytes) = secret {
                let target = self.secret_path(path, *kind);
                let encoded = Zeroizing::new(BASE64.encode(bytes));
                let tmp = Self::write_staged(&target, encoded.as_bytes(), true)?;
                staged.push((tmp, target));
            }
        }
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl DocumentStore for FileStore {
    fn save_record<T: Serialize>(&self, path: &Path, record: &T) -> Result<(), StorageError> {
        let target = self.record_path(path);
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        Self::write_atomic(&target, &json, false)?;

        info!(path = %target.display(), bytes = json.len(), "Saved record");
        Ok(())
    }

    fn load_record<T: DeserializeOwned>(&self, path: &Path) -> Result<T, StorageError> {
        let target = self.record_path(path);
        let json = match fs::read(&target) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(target.display().to_string()))
            }
            Err(e) => return Err(io_error(&target, e)),
        };

        let record = serde_json::from_slice(&json)
            .map_err(|e| StorageError::Serialization(format!("{}: {}", target.display(), e)))?;

        debug!(path = %target.display(), "Loaded record");
        Ok(record)
    }

    fn save_secret(&self, path: &Path, kind: SecretKind, secret: &[u8]) -> Result<(), StorageError> {
        let target = self.secret_path(path, kind);
        let encoded = Zeroizing::new(BASE64.encode(secret));

        Self::write_atomic(&target, encoded.as_bytes(), true)?;

        debug!(path = %target.display(), kind = %kind, "Saved secret");
        Ok(())
    }

    fn load_secret(
        &self,
        path: &Path,
        kind: SecretKind,
    ) -> Result<Option<Zeroizing<Vec<u8>>>, StorageError> {
        let target = self.secret_path(path, kind);
        let encoded = match fs::read_to_string(&target) {
            Ok(encoded) => Zeroizing::new(encoded),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&target, e)),
        };

        let secret = BASE64
            .decode(encoded.trim())
            .map_err(|e| StorageError::Serialization(format!("{}: {}", target.display(), e)))?;

        debug!(path = %target.display(), kind = %kind, "Loaded secret");
        Ok(Some(Zeroizing::new(secret)))
    }

    fn remove_secret(&self, path: &Path, kind: SecretKind) -> Result<(), StorageError> {
        let target = self.secret_path(path, kind);
        match fs::remove_file(&target) {
            Ok(()) => {
                debug!(path = %target.display(), kind = %kind, "Removed secret");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&target, e)),
        }
    }

    /// Stages every sidecar, writes the record, then moves the sidecars
    /// into place. If staging or the record fails, the previous document
    /// and its sidecars are left untouched.
    fn save_document<T: Serialize>(
        &self,
        path: &Path,
        record: &T,
        secrets: &[(SecretKind, Option<&[u8]>)],
    ) -> Result<(), StorageError> {
        let mut staged = Vec::new();
        let written = self
            .stage_secrets(path, secrets, &mut staged)
            .and_then(|()| self.save_record(path, record));
        if let Err(e) = written {
            for (tmp, _) in &staged {
                let _ = fs::remove_file(tmp);
            }
            return Err(e);
        }

        for (tmp, target) in &staged {
            Self::commit(tmp, target)?;
        }
        for (kind, secret) in secrets {
            if secret.is_none() {
                self.remove_secret(path, *kind)?;
            }
        }

        debug!(path = %path.display(), sidecars = staged.len(), "Saved document");
        Ok(())
    }
}
