//! Administration HTTP API.

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::middleware::{auth, require_admin};
use crate::router::Valid;
use crate::user::{Role, RoleCounts, User, UserFilter};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    skip: Option<i64>,
    limit: Option<i64>,
    role: Option<Role>,
    search: Option<String>,
}

/// Filtered user listing, newest first.
pub async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<User>>> {
    let filter = UserFilter {
        role: query.role,
        search: query.search,
        skip: query.skip.unwrap_or(0).max(0),
        limit: query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE),
    };

    Ok(Json(state.users.list(&filter).await?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Overview {
    pub users: RoleCounts,
}

/// Per-role account counts.
pub async fn overview_handler(
    State(state): State<AppState>,
) -> Result<Json<Overview>> {
    Ok(Json(Overview {
        users: state.users.count_by_role().await?,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

/// Delete a non-admin account.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Message>> {
    state.identity.delete_user(user_id).await?;

    Ok(Json(Message {
        message: "user deleted".to_owned(),
    }))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResetBody {
    #[validate(
        length(
            min = 8,
            max = 255,
            message = "Password must contain at least 8 characters."
        ),
        custom(
            function = "crate::policy::validate_password",
            message = "Password is too weak."
        )
    )]
    new_password: String,
}

/// Set a chosen password on a non-admin account.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Valid(body): Valid<ResetBody>,
) -> Result<Json<Message>> {
    let user = state
        .identity
        .reset_password(user_id, &body.new_password)
        .await?;

    Ok(Json(Message {
        message: format!("password reset for {}", user.email),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeneratedPassword {
    pub message: String,
    /// Plaintext shown exactly once; only the digest is stored.
    pub temporary_password: String,
}

/// Set a generated one-time password on a non-admin account.
pub async fn generate_password_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<GeneratedPassword>> {
    let (user, password) = state.identity.generate_password(user_id).await?;

    Ok(Json(GeneratedPassword {
        message: format!("new password generated for {}", user.email),
        temporary_password: password,
    }))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(list_handler))
        .route("/users/{user_id}", delete(delete_handler))
        .route(
            "/users/{user_id}/reset-password",
            post(reset_password_handler),
        )
        .route(
            "/users/{user_id}/generate-password",
            post(generate_password_handler),
        )
        .route("/stats/overview", get(overview_handler))
        // Authentication runs first, then the role gate.
        .route_layer(axum::middleware::from_fn(require_admin))
        .route_layer(axum::middleware::from_fn_with_state(state, auth))
}
