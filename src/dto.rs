//! Request/response shapes that are not tied to a stored model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// POST /api/auth/login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,
}

/// Acknowledgement used by the step ingestion endpoint
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub date: NaiveDate,
    pub exists: bool,
}

/// GET /api/dashboard
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Number of recent entries to include. Default: 10
    pub recent: Option<usize>,
    /// Number of top words to include. Default: 50
    pub words: Option<usize>,
}

/// POST /api/images?name=photo.jpg
#[derive(Debug, Deserialize)]
pub struct ImageUploadQuery {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub reference: String,
}

/// GET /images/{reference}?expires=..&signature=..
#[derive(Debug, Deserialize)]
pub struct SignedImageQuery {
    pub expires: i64,
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_response_shape() {
        let json = serde_json::to_value(StatusResponse {
            status: "ok",
            message: "Steps recorded".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"status": "ok", "message": "Steps recorded"}));
    }

    #[test]
    fn test_login_request_requires_password() {
        let req: LoginRequest = serde_json::from_str(r#"{"password":""}"#).unwrap();
        assert!(req.validate().is_err());
        assert!(serde_json::from_str::<LoginRequest>("{}").is_err());
    }
}
