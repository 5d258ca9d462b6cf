use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::dto::ExistsResponse;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::entry::{
    CreateEntryRequest, Entry, EntryChanges, ExistsQuery, NewEntry, UpdateEntryRequest,
};
use crate::services::images::validate_reference;
use crate::services::weather::Weather;
use crate::services::{sentiment, topic};
use crate::AppState;

pub async fn list_entries(State(state): State<AppState>) -> AppResult<Json<Vec<Entry>>> {
    let entries = state.store.list_active().await?;
    Ok(Json(entries))
}

pub async fn get_entry(
    State(state): State<AppState>,
    AppPath(entry_id): AppPath<i64>,
) -> AppResult<Json<Entry>> {
    let entry = state
        .store
        .get(entry_id)
        .await?
        .ok_or(AppError::NotFound("Entry not found".into()))?;

    Ok(Json(entry))
}

/// The "add entry" workflow: validate, reject a second entry for the day,
/// enrich, then persist.
pub async fn create_entry(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateEntryRequest>,
) -> AppResult<(StatusCode, Json<Entry>)> {
    body.validate()?;
    let text = body.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Entry text is required".into()));
    }
    if let Some(reference) = &body.image_path {
        validate_reference(reference)?;
    }

    let today = Utc::now().date_naive();
    let entry_date = body.entry_date.unwrap_or(today);

    // Friendly early answer; the unique index still catches a racing insert.
    if state.store.exists_for_date(entry_date).await? {
        return Err(AppError::Conflict(format!(
            "An entry already exists for {entry_date}"
        )));
    }

    let sentiment = sentiment::analyze(text);
    // Current conditions say nothing about a back-dated day
    let weather = if entry_date == today {
        lookup_weather(&state).await
    } else {
        None
    };

    let new_entry = NewEntry {
        entry_date,
        text: text.to_string(),
        sentiment: sentiment.score,
        mood: sentiment.mood,
        temperature: weather.as_ref().map(|w| w.temperature),
        weather: weather.map(|w| w.description),
        image_path: body.image_path,
        topic: topic::classify(text).map(str::to_string),
        song: body.song,
        genre: body.genre,
    };

    let entry = state.store.create(&new_entry).await?;
    tracing::info!(
        entry_id = entry.id,
        entry_date = %entry.entry_date,
        mood = %entry.mood,
        "Entry created"
    );

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    AppPath(entry_id): AppPath<i64>,
    AppJson(body): AppJson<UpdateEntryRequest>,
) -> AppResult<Json<Entry>> {
    body.validate()?;
    if let Some(reference) = &body.image_path {
        validate_reference(reference)?;
    }

    let mut changes = EntryChanges {
        weather: body.weather,
        temperature: body.temperature,
        image_path: body.image_path,
        song: body.song,
        genre: body.genre,
        ..Default::default()
    };

    // Derived fields follow the text
    if let Some(text) = body.text.as_deref().map(str::trim) {
        if text.is_empty() {
            return Err(AppError::Validation("Entry text is required".into()));
        }
        let sentiment = sentiment::analyze(text);
        changes.sentiment = Some(sentiment.score);
        changes.mood = Some(sentiment.mood);
        changes.topic = topic::classify(text).map(str::to_string);
        changes.text = Some(text.to_string());
    }

    let entry = state.store.update(entry_id, &changes).await?;
    tracing::info!(entry_id = entry.id, mood = %entry.mood, "Entry updated");

    Ok(Json(entry))
}

/// Soft delete; the row and any stored image are kept.
pub async fn delete_entry(
    State(state): State<AppState>,
    AppPath(entry_id): AppPath<i64>,
) -> AppResult<Json<Entry>> {
    let entry = state.store.soft_delete(entry_id).await?;
    tracing::info!(entry_id = entry.id, entry_date = %entry.entry_date, "Entry deleted");

    Ok(Json(entry))
}

pub async fn entry_exists(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ExistsQuery>,
) -> AppResult<Json<ExistsResponse>> {
    let exists = state.store.exists_for_date(query.date).await?;
    Ok(Json(ExistsResponse {
        date: query.date,
        exists,
    }))
}

/// A failed lookup never blocks saving the entry.
async fn lookup_weather(state: &AppState) -> Option<Weather> {
    match state
        .weather
        .current(state.config.latitude, state.config.longitude)
        .await
    {
        Ok(weather) => weather,
        Err(e) => {
            tracing::warn!(error = %e, "Weather lookup failed, saving entry without weather");
            None
        }
    }
}
