//! Remote object-gateway storage backend.
//!
//! Speaks plain HTTP to an object store fronting (PUT/DELETE on
//! `{endpoint}/{bucket}/{key}`), with optional bearer authentication.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::{StorageBackend, StorageError, check_key};

pub struct RemoteHttpBackend {
    client: Client,
    endpoint: String,
    bucket: String,
    token: Option<String>,
}

impl RemoteHttpBackend {
    /// Create a new [`RemoteHttpBackend`].
    pub fn new(endpoint: String, bucket: String, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            bucket,
            token,
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl StorageBackend for RemoteHttpBackend {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        check_key(key)?;

        let request = self.client.put(self.object_url(key)).body(bytes.to_vec());
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| StorageError::Write(err.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::Write(format!(
                "gateway answered {} for '{key}'",
                response.status()
            )));
        }

        tracing::debug!(%key, size_bytes = bytes.len(), "file sent to object gateway");
        Ok(key.to_owned())
    }

    async fn delete(&self, reference: &str) -> Result<(), StorageError> {
        if check_key(reference).is_err() {
            return Ok(());
        }

        let request = self.client.delete(self.object_url(reference));
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| StorageError::Delete(err.to_string()))?;

        // Absence is success: the reference no longer resolves either way.
        if response.status() == StatusCode::NOT_FOUND
            || response.status().is_success()
        {
            return Ok(());
        }

        Err(StorageError::Delete(format!(
            "gateway answered {} for '{reference}'",
            response.status()
        )))
    }
}
