//! Current-account HTTP API.

use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::AppState;
use crate::middleware::auth;
use crate::user::User;

/// The authenticated account, loaded by the auth middleware.
pub async fn handler(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `GET /users/@me` goes to `handler`. Authorization required.
        .route("/@me", get(handler))
        .route_layer(axum::middleware::from_fn_with_state(state, auth))
}

#[cfg(test)]
pub(super) mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;

    use crate::user::{Candidate, User};
    use crate::{app, make_request, router};

    #[tokio::test]
    async fn test_me_handler() {
        let state = router::state();
        let user = state
            .identity
            .register(Candidate {
                email: "ada@example.com".to_owned(),
                password: "Sufficient1".to_owned(),
                full_name: "Ada Lovelace".to_owned(),
                ..Default::default()
            })
            .await
            .unwrap();
        let token = state.token.create(&user.email, user.role, None).unwrap();
        let app = app(state);

        let response = make_request(
            Some(&token),
            app,
            Method::GET,
            "/users/@me",
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let me: User = serde_json::from_slice(&body).unwrap();
        assert_eq!(me.id, user.id);
        assert_eq!(me.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let state = router::state();
        let app = app(state);

        let response = make_request(
            None,
            app.clone(),
            Method::GET,
            "/users/@me",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = make_request(
            Some("definitely.not.a-token"),
            app,
            Method::GET,
            "/users/@me",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_with_deleted_account() {
        let state = router::state();
        let user = state
            .identity
            .register(Candidate {
                email: "ada@example.com".to_owned(),
                password: "Sufficient1".to_owned(),
                full_name: "Ada Lovelace".to_owned(),
                ..Default::default()
            })
            .await
            .unwrap();
        let token = state.token.create(&user.email, user.role, None).unwrap();
        state.identity.delete_user(user.id).await.unwrap();
        let app = app(state);

        // A valid signature over a gone account grants nothing.
        let response = make_request(
            Some(&token),
            app,
            Method::GET,
            "/users/@me",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
