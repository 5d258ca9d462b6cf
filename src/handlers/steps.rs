use axum::{extract::State, Json};
use chrono::NaiveDate;
use validator::Validate;

use crate::dto::StatusResponse;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::models::step::{RecordStepsRequest, StepRecord};
use crate::AppState;

/// Ingestion endpoint for the phone's step counter; one record per day,
/// resubmitting a day replaces its count.
pub async fn add_steps(
    State(state): State<AppState>,
    AppJson(body): AppJson<RecordStepsRequest>,
) -> AppResult<Json<StatusResponse>> {
    body.validate()?;

    let record = state.store.record_steps(body.date, body.steps).await?;
    tracing::info!(
        step_date = %record.step_date,
        step_count = record.step_count,
        "Steps recorded"
    );

    Ok(Json(StatusResponse {
        status: "ok",
        message: "Steps recorded".into(),
    }))
}

pub async fn list_steps(State(state): State<AppState>) -> AppResult<Json<Vec<StepRecord>>> {
    let records = state.store.list_steps().await?;
    Ok(Json(records))
}

pub async fn get_steps(
    State(state): State<AppState>,
    AppPath(date): AppPath<NaiveDate>,
) -> AppResult<Json<StepRecord>> {
    let record = state
        .store
        .steps_for_date(date)
        .await?
        .ok_or(AppError::NotFound(format!("No steps recorded for {date}")))?;

    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::handlers::test_util::TestApp;

    #[tokio::test]
    async fn test_add_steps_then_read() {
        let app = TestApp::new().await;
        let (status, body) = app
            .send(
                Method::POST,
                "/add_steps",
                Some(json!({"date": "2025-05-01", "steps": 5000})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "message": "Steps recorded"}));

        let (status, record) = app.send(Method::GET, "/api/steps/2025-05-01", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["step_count"], 5000);

        let (status, _) = app.send(Method::GET, "/api/steps/2025-05-02", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_steps_join_onto_entries() {
        let app = TestApp::new().await;
        app.send(
            Method::POST,
            "/api/entries",
            Some(json!({"entry_date": "2025-05-02", "text": "Long walk"})),
        )
        .await;
        app.send(
            Method::POST,
            "/add_steps",
            Some(json!({"date": "2025-05-02", "steps": 12000})),
        )
        .await;

        let (_, entries) = app.send(Method::GET, "/api/entries", None).await;
        assert_eq!(entries[0]["steps"], 12000);

        let (_, all) = app.send(Method::GET, "/api/steps", None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_negative_steps_rejected() {
        let app = TestApp::new().await;
        let (status, _) = app
            .send(
                Method::POST,
                "/add_steps",
                Some(json!({"date": "2025-05-01", "steps": -1})),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
