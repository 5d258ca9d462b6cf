use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::dto::{ImageUploadQuery, ImageUploadResponse, SignedImageQuery};
use crate::error::{AppError, AppResult};
use crate::extract::{AppPath, AppQuery};
use crate::services::images::{content_type, SignedUrl};
use crate::AppState;

/// Raw image body; the extension of `name` picks the stored type.
pub async fn upload_image(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ImageUploadQuery>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<ImageUploadResponse>)> {
    let reference = state.images.save(&body, &query.name).await?;
    Ok((StatusCode::CREATED, Json(ImageUploadResponse { reference })))
}

pub async fn image_url(
    State(state): State<AppState>,
    AppPath(reference): AppPath<String>,
) -> AppResult<Json<SignedUrl>> {
    let signed = state.images.signed_url(&reference, Utc::now())?;
    Ok(Json(signed))
}

/// Public route; access is granted by the signature alone.
pub async fn serve_image(
    State(state): State<AppState>,
    AppPath(reference): AppPath<String>,
    AppQuery(query): AppQuery<SignedImageQuery>,
) -> AppResult<impl IntoResponse> {
    if !state
        .images
        .verify(&reference, query.expires, &query.signature, Utc::now())
    {
        tracing::warn!(reference = %reference, "Rejected image link");
        return Err(AppError::Unauthorized);
    }

    let bytes = state.images.load(&reference).await?;
    Ok(([(header::CONTENT_TYPE, content_type(&reference))], bytes))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::json;

    use crate::handlers::test_util::{body_bytes, body_json, TestApp};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    async fn upload(app: &TestApp, name: &str, bytes: &'static [u8]) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/images?name={name}"))
            .header(header::AUTHORIZATION, app.bearer())
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(Body::from(bytes))
            .unwrap();
        let response = app.raw(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    fn path_and_query(url: &str) -> &str {
        url.strip_prefix("http://journal.test").unwrap()
    }

    #[tokio::test]
    async fn test_upload_sign_and_fetch() {
        let app = TestApp::new().await;
        let (status, body) = upload(&app, "holiday.PNG", PNG).await;
        assert_eq!(status, StatusCode::CREATED);
        let reference = body["reference"].as_str().unwrap().to_string();
        assert!(reference.ends_with(".png"));

        let (status, signed) = app
            .send(Method::GET, &format!("/api/images/{reference}/url"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let url = signed["url"].as_str().unwrap();

        // no bearer token needed
        let request = Request::builder()
            .uri(path_and_query(url))
            .body(Body::empty())
            .unwrap();
        let response = app.raw(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(body_bytes(response).await, PNG);
    }

    #[tokio::test]
    async fn test_tampered_link_rejected() {
        let app = TestApp::new().await;
        let (_, body) = upload(&app, "a.jpg", PNG).await;
        let reference = body["reference"].as_str().unwrap().to_string();
        let (_, signed) = app
            .send(Method::GET, &format!("/api/images/{reference}/url"), None)
            .await;
        let url = signed["url"].as_str().unwrap();
        let tampered = path_and_query(url).replace("expires=", "expires=9");

        let request = Request::builder().uri(tampered).body(Body::empty()).unwrap();
        assert_eq!(app.raw(request).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unsupported_type_rejected() {
        let app = TestApp::new().await;
        let (status, body) = upload(&app, "notes.gif", PNG).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], 422);
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let app = TestApp::with_config(|c| c.image_max_bytes = 4).await;
        let (status, _) = upload(&app, "big.png", PNG).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_entry_keeps_uploaded_reference() {
        let app = TestApp::new().await;
        let (_, body) = upload(&app, "a.jpeg", PNG).await;
        let reference = body["reference"].as_str().unwrap();

        let (status, entry) = app
            .send(
                Method::POST,
                "/api/entries",
                Some(json!({"entry_date": "2025-05-01", "text": "Photo day", "image_path": reference})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry["image_path"], reference);
    }
}
