use axum::{extract::State, Json};
use validator::Validate;

use crate::auth::{
    jwt::{create_access_token, AccessToken},
    password::verify_password,
};
use crate::dto::LoginRequest;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::AppState;

/// Exchanges the journal password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<Json<AccessToken>> {
    body.validate()?;

    if !verify_password(&body.password, &state.config.app_password_hash)? {
        tracing::warn!("Login with wrong password");
        return Err(AppError::Unauthorized);
    }

    let token = create_access_token(&state.config)?;
    tracing::info!("Login succeeded");
    Ok(Json(token))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::auth::password::hash_password;
    use crate::handlers::test_util::TestApp;

    async fn app() -> TestApp {
        let hash = hash_password("thankful").unwrap();
        TestApp::with_config(|c| c.app_password_hash = hash).await
    }

    #[tokio::test]
    async fn test_login_issues_usable_token() {
        let app = app().await;
        let (status, body) = app
            .send_unauthenticated(
                Method::POST,
                "/api/auth/login",
                Some(json!({"password": "thankful"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["expires_in"], 900);
        let token = body["access_token"].as_str().unwrap();

        let request = axum::http::Request::builder()
            .uri("/api/entries")
            .header("authorization", format!("Bearer {token}"))
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(app.raw(request).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let app = app().await;
        let (status, _) = app
            .send_unauthenticated(
                Method::POST,
                "/api/auth/login",
                Some(json!({"password": "nope"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_is_rate_limited() {
        let app = app().await;
        let mut last = StatusCode::OK;
        for _ in 0..6 {
            let (status, _) = app
                .send_unauthenticated(
                    Method::POST,
                    "/api/auth/login",
                    Some(json!({"password": "guess"})),
                )
                .await;
            last = status;
        }
        assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);
    }
}
