//! HTTP routes.

pub mod admin;
pub mod create;
pub mod login;
pub mod status;
pub mod upload;
pub mod users;

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ServerError;

/// JSON extractor that runs model validation before the handler body.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;

        Ok(Valid(value))
    }
}

/// Database-free [`crate::AppState`] for handler tests.
#[cfg(test)]
pub(crate) fn state() -> crate::AppState {
    use std::sync::Arc;

    use crate::storage::LocalDiskBackend;
    use crate::upload::UploadService;
    use crate::user::{IdentityService, MemoryUserStore, UserStore};

    let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::default());
    let identity =
        IdentityService::new(Arc::clone(&users), crate::crypto::test_crypto())
            .expect("cannot create identity service");

    let root = std::env::temp_dir()
        .join(format!("didactic-test-{}", uuid::Uuid::new_v4()));
    let uploads =
        UploadService::new(Arc::new(LocalDiskBackend::new(root)), None);

    crate::AppState {
        config: Arc::new(crate::config::Configuration::default()),
        users,
        identity,
        token: crate::token::TokenManager::new("didactic", "test-secret", None),
        uploads,
    }
}
