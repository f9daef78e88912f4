//! Local-disk storage backend.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::{StorageBackend, StorageError, check_key};

/// Stores files under a root directory, one subdirectory per owner.
///
/// References stay relative so a static-file layer can serve them as-is.
pub struct LocalDiskBackend {
    root: PathBuf,
}

impl LocalDiskBackend {
    /// Create a new [`LocalDiskBackend`].
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl StorageBackend for LocalDiskBackend {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        check_key(key)?;

        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::Write(err.to_string()))?;
        }

        fs::write(&path, bytes)
            .await
            .map_err(|err| StorageError::Write(err.to_string()))?;

        tracing::debug!(%key, size_bytes = bytes.len(), "file written to disk");
        Ok(key.to_owned())
    }

    async fn delete(&self, reference: &str) -> Result<(), StorageError> {
        if check_key(reference).is_err() {
            // Nothing such a reference could name.
            return Ok(());
        }

        match fs::remove_file(self.root.join(reference)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Delete(err.to_string())),
        }
    }
}
