//! Account registration.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::user::{Candidate, User};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    email: String,
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
    password: String,
    #[validate(custom(
        function = "crate::policy::validate_full_name",
        message = "Full name must contain at least 2 letters."
    ))]
    full_name: String,
    #[validate(custom(
        function = "crate::policy::validate_phone",
        message = "Phone must be E.164 formatted."
    ))]
    phone: Option<String>,
    country: Option<String>,
    occupation: Option<String>,
    #[validate(length(
        equal = 2,
        message = "Language must be ISO 639-1 alpha-2."
    ))]
    preferred_language: Option<String>,
}

/// Handler to register a user.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state
        .identity
        .register(Candidate {
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            phone: body.phone,
            country: body.country,
            occupation: body.occupation,
            preferred_language: body.preferred_language,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[cfg(test)]
pub(super) mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;

    use crate::user::{Role, User};
    use crate::{app, make_request, router};

    #[tokio::test]
    async fn test_register_handler() {
        let state = router::state();
        let app = app(state.clone());

        let response = make_request(
            None,
            app,
            Method::POST,
            "/register",
            json!({
                "email": "Ada@Example.com",
                "password": "Sufficient1",
                "full_name": "Ada Lovelace",
                "phone": "+33612345678",
            })
            .to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let user: User = serde_json::from_slice(&body).unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, Role::Student);
        assert!(user.student_id.starts_with("IQD-"));
        // full name + email + phone out of the six profile fields.
        assert_eq!(user.profile_completion, 50);

        // The digest never leaves the server.
        let raw: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(raw.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_register_with_weak_password() {
        let state = router::state();
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/register",
            json!({
                "email": "ada@example.com",
                "password": "nodigitshere",
                "full_name": "Ada Lovelace",
            })
            .to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let state = router::state();
        let app = app(state);

        let body = json!({
            "email": "ada@example.com",
            "password": "Sufficient1",
            "full_name": "Ada Lovelace",
        })
        .to_string();

        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/register",
            body.clone(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response =
            make_request(None, app, Method::POST, "/register", body).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
