use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub entry_date: NaiveDate,
    pub text: String,
    pub sentiment: f64,
    pub mood: Mood,
    pub weather: Option<String>,
    pub temperature: Option<f64>,
    pub image_path: Option<String>,
    pub topic: Option<String>,
    pub song: Option<String>,
    pub genre: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Step count recorded for the same date, when one exists.
    pub steps: Option<i64>,
}

#[cfg(test)]
impl Entry {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// `entries` row as stored. The mood column may hold labels written by
/// older versions of the journal, so it is resolved on the way out.
#[derive(Debug, FromRow)]
pub struct EntryRow {
    pub id: i64,
    pub entry_date: NaiveDate,
    pub entry_text: String,
    pub sentiment: f64,
    pub mood: String,
    pub weather: Option<String>,
    pub temperature: Option<f64>,
    pub image_path: Option<String>,
    pub topic: Option<String>,
    pub song: Option<String>,
    pub genre: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub steps: Option<i64>,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        let mood = Mood::from_label(&row.mood).unwrap_or_else(|| {
            tracing::debug!(entry_id = row.id, label = %row.mood, "Re-deriving unknown mood label");
            Mood::from_score(row.sentiment)
        });

        Self {
            id: row.id,
            entry_date: row.entry_date,
            text: row.entry_text,
            sentiment: row.sentiment,
            mood,
            weather: row.weather,
            temperature: row.temperature,
            image_path: row.image_path,
            topic: row.topic,
            song: row.song,
            genre: row.genre,
            created_at: row.created_at,
            modified_at: row.modified_at,
            deleted_at: row.deleted_at,
            steps: row.steps,
        }
    }
}

/// Mood label derived from a compound sentiment score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mood {
    Elated,
    Happy,
    Neutral,
    Sad,
    Upset,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Elated,
        Mood::Happy,
        Mood::Neutral,
        Mood::Sad,
        Mood::Upset,
    ];

    /// Thresholds: `>= 0.5` Elated, `[0.05, 0.5)` Happy, `(-0.05, 0.05)` Neutral,
    /// `[-0.5, -0.05]` Sad, `< -0.5` Upset.
    pub fn from_score(score: f64) -> Self {
        if !score.is_finite() {
            return Mood::Neutral;
        }
        let score = score.clamp(-1.0, 1.0);
        if score >= 0.5 {
            Mood::Elated
        } else if score >= 0.05 {
            Mood::Happy
        } else if score > -0.05 {
            Mood::Neutral
        } else if score >= -0.5 {
            Mood::Sad
        } else {
            Mood::Upset
        }
    }

    /// 1-5 scale used for charting (Upset = 1, Elated = 5).
    pub fn level(self) -> u8 {
        match self {
            Mood::Elated => 5,
            Mood::Happy => 4,
            Mood::Neutral => 3,
            Mood::Sad => 2,
            Mood::Upset => 1,
        }
    }

    /// Accepts a mood name in any case or a 1-5 level.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Mood::ALL.into_iter().find(|mood| {
            mood.as_str().eq_ignore_ascii_case(label) || label == mood.level().to_string()
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Elated => "Elated",
            Mood::Happy => "Happy",
            Mood::Neutral => "Neutral",
            Mood::Sad => "Sad",
            Mood::Upset => "Upset",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully enriched row handed to the store on create.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub entry_date: NaiveDate,
    pub text: String,
    pub sentiment: f64,
    pub mood: Mood,
    pub weather: Option<String>,
    pub temperature: Option<f64>,
    pub image_path: Option<String>,
    pub topic: Option<String>,
    pub song: Option<String>,
    pub genre: Option<String>,
}

/// Partial update; `None` leaves the stored value as it is. The exception is
/// `topic`, which is derived from the text and is written, `None` included,
/// whenever `text` is set.
#[derive(Debug, Clone, Default)]
pub struct EntryChanges {
    pub text: Option<String>,
    pub sentiment: Option<f64>,
    pub mood: Option<Mood>,
    pub weather: Option<String>,
    pub temperature: Option<f64>,
    pub image_path: Option<String>,
    pub topic: Option<String>,
    pub song: Option<String>,
    pub genre: Option<String>,
}

/// POST /api/entries
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntryRequest {
    /// Defaults to today (UTC)
    pub entry_date: Option<NaiveDate>,

    #[validate(length(min = 1, max = 10000, message = "Text must be 1-10000 characters"))]
    pub text: String,

    pub image_path: Option<String>,

    #[validate(length(max = 500))]
    pub song: Option<String>,

    #[validate(length(max = 200))]
    pub genre: Option<String>,
}

/// PUT /api/entries/{id}, all fields optional
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEntryRequest {
    #[validate(length(min = 1, max = 10000, message = "Text must be 1-10000 characters"))]
    pub text: Option<String>,

    #[validate(length(max = 200))]
    pub weather: Option<String>,

    pub temperature: Option<f64>,
    pub image_path: Option<String>,

    #[validate(length(max = 500))]
    pub song: Option<String>,

    #[validate(length(max = 200))]
    pub genre: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExistsQuery {
    pub date: NaiveDate,
}
