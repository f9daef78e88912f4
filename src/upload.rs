//! Profile-picture upload orchestration.
//!
//! Validates the incoming file, derives an owner-partitioned storage key
//! and delegates to the configured [`StorageBackend`]. Identity state is
//! never mutated here; callers record the returned reference themselves.

use std::sync::Arc;
use std::time::Duration;

use rand::RngCore;
use rand::rngs::OsRng;
use tokio::time::timeout;
use uuid::Uuid;

use crate::config;
use crate::error::{Result, ServerError};
use crate::storage::{StorageBackend, StorageError};

/// Accepted profile-picture extensions, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

/// Default file-size ceiling: 5 MiB.
pub const DEFAULT_MAX_SIZE_BYTES: usize = 5 * 1024 * 1024;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const KEY_SUFFIX_BYTES: usize = 8;

/// Upload manager over the active storage backend.
#[derive(Clone)]
pub struct UploadService {
    backend: Arc<dyn StorageBackend>,
    max_size_bytes: usize,
    timeout: Duration,
}

impl UploadService {
    /// Create a new [`UploadService`].
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        config: Option<&config::Upload>,
    ) -> Self {
        Self {
            backend,
            max_size_bytes: config
                .and_then(|c| c.max_size_bytes)
                .unwrap_or(DEFAULT_MAX_SIZE_BYTES),
            timeout: Duration::from_secs(
                config
                    .and_then(|c| c.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }

    /// Maximum accepted file size, in bytes.
    pub fn max_size_bytes(&self) -> usize {
        self.max_size_bytes
    }

    /// Validate and store a profile picture, returning its reference.
    ///
    /// The size check runs against the bytes actually received, not any
    /// client-supplied header. The key embeds the owner twice:
    /// `{owner}/{owner}_{hex}{ext}` — directory partition plus a
    /// collision-resistant filename that stays human-traceable.
    pub async fn upload_profile_picture(
        &self,
        owner: Uuid,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, extension)| extension.to_lowercase())
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ServerError::UnsupportedFileType { extension });
        }

        if bytes.len() > self.max_size_bytes {
            return Err(ServerError::FileTooLarge {
                size: bytes.len(),
                limit: self.max_size_bytes,
            });
        }

        let mut suffix = [0u8; KEY_SUFFIX_BYTES];
        OsRng.fill_bytes(&mut suffix);
        let key = format!("{owner}/{owner}_{}.{extension}", hex::encode(suffix));

        let reference = timeout(self.timeout, self.backend.put(&key, bytes))
            .await
            .map_err(|_| StorageError::Write("operation timed out".to_owned()))??;

        Ok(reference)
    }

    /// Remove a stored profile picture.
    ///
    /// Idempotent: a reference that no longer resolves is a success.
    pub async fn delete_profile_picture(&self, reference: &str) -> Result<()> {
        timeout(self.timeout, self.backend.delete(reference))
            .await
            .map_err(|_| StorageError::Delete("operation timed out".to_owned()))??;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalDiskBackend;

    fn service(dir: &tempfile::TempDir, max: Option<usize>) -> UploadService {
        UploadService::new(
            Arc::new(LocalDiskBackend::new(dir.path().to_path_buf())),
            Some(&config::Upload {
                max_size_bytes: max,
                timeout_secs: Some(2),
            }),
        )
    }

    #[tokio::test]
    async fn test_upload_success() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = service(&dir, None);
        let owner = Uuid::new_v4();

        let reference = uploads
            .upload_profile_picture(owner, "photo.PNG", &[0u8; 2048])
            .await
            .unwrap();

        assert!(reference.starts_with(&format!("{owner}/{owner}_")));
        assert!(reference.ends_with(".png"));
        assert!(dir.path().join(&reference).exists());
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = service(&dir, None);

        let err = uploads
            .upload_profile_picture(Uuid::new_v4(), "photo.bmp", &[0u8; 16])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServerError::UnsupportedFileType { extension } if extension == "bmp"
        ));

        let err = uploads
            .upload_profile_picture(Uuid::new_v4(), "no-extension", &[0u8; 16])
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::UnsupportedFileType { .. }));
    }

    #[tokio::test]
    async fn test_file_too_large() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = service(&dir, Some(1024));

        let err = uploads
            .upload_profile_picture(Uuid::new_v4(), "photo.png", &[0u8; 1025])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServerError::FileTooLarge { size: 1025, limit: 1024 }
        ));

        // At the limit is fine.
        assert!(
            uploads
                .upload_profile_picture(Uuid::new_v4(), "photo.png", &[0u8; 1024])
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = service(&dir, None);
        let owner = Uuid::new_v4();

        let reference = uploads
            .upload_profile_picture(owner, "photo.jpg", &[0u8; 64])
            .await
            .unwrap();

        uploads.delete_profile_picture(&reference).await.unwrap();
        assert!(!dir.path().join(&reference).exists());

        // Second delete is a no-op.
        uploads.delete_profile_picture(&reference).await.unwrap();
    }
}
