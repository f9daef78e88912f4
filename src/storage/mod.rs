//! Pluggable profile-picture storage.
//!
//! New backends implement [`StorageBackend`] and get wired in
//! [`from_config`]; the tag is resolved once at startup, never per call.

mod local;
mod remote;

pub use local::LocalDiskBackend;
pub use remote::RemoteHttpBackend;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config;

const DEFAULT_LOCAL_ROOT: &str = "uploads";

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("storage write failed: {0}")]
    Write(String),
    #[error("storage delete failed: {0}")]
    Delete(String),
    #[error("storage backend '{0}' is not supported")]
    Unsupported(String),
    #[error("storage backend '{tag}' is missing `{field}`")]
    Misconfigured { tag: String, field: &'static str },
}

/// Capability interface: put bytes under a logical key, delete by key.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `bytes` under `key` and return the stable reference string.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Delete a stored reference.
    ///
    /// Idempotent: deleting a nonexistent reference is a no-op, not an
    /// error.
    async fn delete(&self, reference: &str) -> Result<(), StorageError>;
}

/// Resolve the configured backend tag into a concrete instance.
///
/// Unknown tags fail fast here rather than silently no-oping later.
pub fn from_config(
    config: &config::Storage,
) -> Result<Arc<dyn StorageBackend>, StorageError> {
    match config.backend.as_str() {
        "local" => {
            let root = config
                .root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_ROOT));
            Ok(Arc::new(LocalDiskBackend::new(root)))
        },
        "http" => {
            let endpoint = config.endpoint.clone().ok_or(
                StorageError::Misconfigured {
                    tag: "http".to_owned(),
                    field: "endpoint",
                },
            )?;
            let bucket =
                config.bucket.clone().ok_or(StorageError::Misconfigured {
                    tag: "http".to_owned(),
                    field: "bucket",
                })?;

            Ok(Arc::new(RemoteHttpBackend::new(
                endpoint,
                bucket,
                config.token.clone(),
            )))
        },
        other => Err(StorageError::Unsupported(other.to_owned())),
    }
}

/// Reject keys that could escape the backend's namespace.
pub(crate) fn check_key(key: &str) -> Result<(), StorageError> {
    let traversal = key.split('/').any(|part| part == ".." || part.is_empty());
    if key.is_empty() || key.starts_with('/') || traversal {
        return Err(StorageError::Write(format!("invalid storage key '{key}'")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_dispatch() {
        let local = config::Storage {
            backend: "local".to_owned(),
            ..Default::default()
        };
        assert!(from_config(&local).is_ok());

        let http = config::Storage {
            backend: "http".to_owned(),
            endpoint: Some("https://objects.example.com".to_owned()),
            bucket: Some("avatars".to_owned()),
            ..Default::default()
        };
        assert!(from_config(&http).is_ok());
    }

    #[test]
    fn test_unsupported_tag_fails_fast() {
        let s3 = config::Storage {
            backend: "s3".to_owned(),
            ..Default::default()
        };
        assert!(matches!(
            from_config(&s3),
            Err(StorageError::Unsupported(tag)) if tag == "s3"
        ));
    }

    #[test]
    fn test_http_requires_endpoint() {
        let http = config::Storage {
            backend: "http".to_owned(),
            bucket: Some("avatars".to_owned()),
            ..Default::default()
        };
        assert!(matches!(
            from_config(&http),
            Err(StorageError::Misconfigured { field: "endpoint", .. })
        ));
    }

    #[test]
    fn test_key_check() {
        assert!(check_key("owner/owner_abcd.png").is_ok());
        assert!(check_key("../escape.png").is_err());
        assert!(check_key("owner/../../escape.png").is_err());
        assert!(check_key("/absolute.png").is_err());
        assert!(check_key("").is_err());
    }
}
