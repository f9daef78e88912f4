//! Session issuance.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;

pub const TOKEN_TYPE: &str = "bearer";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    email: String,
    #[validate(length(min = 1, message = "Password cannot be empty."))]
    password: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub access_token: String,
    pub token_type: String,
}

/// Handler to log a user in.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let user = state
        .identity
        .authenticate(&body.email, &body.password)
        .await?;
    let access_token = state.token.create(&user.email, user.role, None)?;

    Ok(Json(Response {
        access_token,
        token_type: TOKEN_TYPE.to_owned(),
    }))
}
