//! Middlewares for routes.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::user::{Role, User};

const BEARER: &str = "Bearer ";

/// Custom middleware for authentification.
///
/// Decodes the bearer token and loads the subject, so downstream handlers
/// work against the stored account rather than stale claims.
pub async fn auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ServerError::Unauthorized)?;
    let token = token.strip_prefix(BEARER).unwrap_or(token);

    let claims = state.token.decode(token)?;
    let user = state
        .users
        .find_by_email(&claims.sub)
        .await?
        .ok_or(ServerError::Unauthorized)?;

    req.extensions_mut().insert::<User>(user);
    Ok(next.run(req).await)
}

/// Restrict a route to admin accounts. Must run after [`auth`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response> {
    match req.extensions().get::<User>() {
        Some(user) if user.role == Role::Admin => Ok(next.run(req).await),
        Some(_) => Err(ServerError::Forbidden("admin access required")),
        None => Err(ServerError::Unauthorized),
    }
}
