use axum::{extract::State, Json};

use crate::dto::DashboardQuery;
use crate::error::AppResult;
use crate::extract::AppQuery;
use crate::services::dashboard::{self, Dashboard, DEFAULT_RECENT, DEFAULT_WORDS};
use crate::AppState;

pub async fn get_dashboard(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<DashboardQuery>,
) -> AppResult<Json<Dashboard>> {
    let entries = state.store.list_active().await?;
    let dashboard = dashboard::build(
        &entries,
        query.recent.unwrap_or(DEFAULT_RECENT),
        query.words.unwrap_or(DEFAULT_WORDS),
    );

    Ok(Json(dashboard))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::handlers::test_util::TestApp;

    #[tokio::test]
    async fn test_empty_dashboard() {
        let app = TestApp::new().await;
        let (status, body) = app.send(Method::GET, "/api/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_entries"], 0);
        assert!(body["mood_over_time"].as_array().unwrap().is_empty());
        assert_eq!(body["mood_counts"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_dashboard_ignores_deleted_entries() {
        let app = TestApp::new().await;
        for (date, text) in [
            ("2025-05-01", "Grateful for coffee with my sister"),
            ("2025-05-02", "Sad and tired"),
            ("2025-05-03", "Coffee in the garden"),
        ] {
            app.send(
                Method::POST,
                "/api/entries",
                Some(json!({"entry_date": date, "text": text})),
            )
            .await;
        }
        let (_, entries) = app.send(Method::GET, "/api/entries", None).await;
        let sad_id = entries[1]["id"].as_i64().unwrap();
        app.send(Method::DELETE, &format!("/api/entries/{sad_id}"), None)
            .await;

        let (_, body) = app
            .send(Method::GET, "/api/dashboard?recent=1&words=1", None)
            .await;
        assert_eq!(body["total_entries"], 2);
        assert_eq!(body["mood_over_time"][0]["date"], "2025-05-01");
        assert_eq!(body["mood_over_time"][1]["date"], "2025-05-03");
        assert_eq!(body["recent_entries"].as_array().unwrap().len(), 1);
        assert_eq!(body["recent_entries"][0]["entry_date"], "2025-05-03");
        assert_eq!(body["word_frequencies"], json!([{"word": "coffee", "count": 2}]));
        assert_eq!(body["topic_counts"]["family"], 1);
        assert_eq!(body["topic_counts"]["nature"], 1);
    }
}
