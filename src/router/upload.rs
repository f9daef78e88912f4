//! Profile-picture HTTP API.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::middleware::auth;
use crate::user::User;

const FILE_FIELD: &str = "file";

/// Body cap above the service-level size ceiling, so oversized files reach
/// the dedicated `413` path instead of a generic body rejection.
const BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Handler to set or replace the profile picture.
pub async fn upload_handler(
    State(state): State<AppState>,
    Extension(mut user): Extension<User>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            let filename = field.file_name().unwrap_or_default().to_owned();
            file = Some((filename, field.bytes().await?));
            break;
        }
    }
    let Some((filename, bytes)) = file else {
        let mut errors = ValidationErrors::new();
        errors.add(FILE_FIELD, ValidationError::new("missing_file_field"));
        return Err(errors.into());
    };

    let previous = user.profile_picture.take();
    let reference = state
        .uploads
        .upload_profile_picture(user.id, &filename, &bytes)
        .await?;

    // The new file is durable before the old reference disappears.
    if let Some(previous) = previous {
        state.uploads.delete_profile_picture(&previous).await?;
    }

    user.profile_picture = Some(reference.clone());
    user.profile_completion = user.calculate_profile_completion();
    state.users.update(&user).await?;

    Ok(Json(UploadResponse {
        url: reference,
        message: "profile picture updated".to_owned(),
    }))
}

/// Handler to remove the profile picture.
pub async fn delete_handler(
    State(state): State<AppState>,
    Extension(mut user): Extension<User>,
) -> Result<Json<DeleteResponse>> {
    let Some(reference) = user.profile_picture.take() else {
        return Err(ServerError::NotFound("profile picture"));
    };

    state.uploads.delete_profile_picture(&reference).await?;

    user.profile_completion = user.calculate_profile_completion();
    state.users.update(&user).await?;

    Ok(Json(DeleteResponse {
        message: "profile picture deleted".to_owned(),
    }))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `POST`/`DELETE /uploads/profile-picture`. Authorization required.
        .route(
            "/profile-picture",
            post(upload_handler).delete(delete_handler),
        )
        .route_layer(axum::middleware::from_fn_with_state(state, auth))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
}

#[cfg(test)]
pub(super) mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::{Method, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    use super::UploadResponse;
    use crate::user::{Candidate, User};
    use crate::{AppState, app, make_request, router};

    const BOUNDARY: &str = "test-boundary";

    fn multipart_body(filename: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; \
             name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn send_file(
        app: Router,
        token: &str,
        filename: &str,
        bytes: &[u8],
    ) -> axum::http::Response<Body> {
        app.oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/uploads/profile-picture")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(multipart_body(filename, bytes)))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn register(state: &AppState) -> (User, String) {
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

        (user, token)
    }

    #[tokio::test]
    async fn test_upload_and_replace() {
        let state = router::state();
        let (user, token) = register(&state).await;
        let app = app(state.clone());

        let response =
            send_file(app.clone(), &token, "photo.png", &[0u8; 256]).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: UploadResponse = serde_json::from_slice(&body).unwrap();
        assert!(body.url.starts_with(&format!("{}/{}_", user.id, user.id)));
        assert!(body.url.ends_with(".png"));

        let stored =
            state.users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.profile_picture.as_deref(), Some(body.url.as_str()));
        // full name + email + picture out of the six profile fields.
        assert_eq!(stored.profile_completion, 50);

        // A second upload swaps the reference.
        let response = send_file(app, &token, "photo.jpg", &[0u8; 256]).await;
        assert_eq!(response.status(), StatusCode::OK);

        let replaced =
            state.users.find_by_id(user.id).await.unwrap().unwrap();
        assert_ne!(replaced.profile_picture, stored.profile_picture);
        assert!(replaced.profile_picture.unwrap().ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_upload_unsupported_extension() {
        let state = router::state();
        let (_, token) = register(&state).await;
        let app = app(state);

        let response = send_file(app, &token, "malware.exe", &[0u8; 16]).await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let state = router::state();
        let (_, token) = register(&state).await;
        let app = app(state);

        let oversized = vec![0u8; crate::upload::DEFAULT_MAX_SIZE_BYTES + 1];
        let response = send_file(app, &token, "photo.png", &oversized).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_upload_requires_token() {
        let state = router::state();
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/uploads/profile-picture",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_profile_picture() {
        let state = router::state();
        let (user, token) = register(&state).await;
        let app = app(state.clone());

        // Nothing to delete yet.
        let response = make_request(
            Some(&token),
            app.clone(),
            Method::DELETE,
            "/uploads/profile-picture",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        send_file(app.clone(), &token, "photo.png", &[0u8; 64]).await;

        let response = make_request(
            Some(&token),
            app,
            Method::DELETE,
            "/uploads/profile-picture",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let stored =
            state.users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.profile_picture, None);
    }
}
