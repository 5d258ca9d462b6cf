use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{Database, Pool};

use crate::error::{AppError, AppResult};
use crate::models::entry::{Entry, EntryChanges, EntryRow, Mood, NewEntry};
use crate::models::step::StepRecord;

/// Durable CRUD over journal entries and daily step records.
///
/// Entries are never physically removed: `soft_delete` stamps `deleted_at`
/// and every listing or existence check ignores such rows. Only `get` sees
/// them.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Active entries, newest `entry_date` first.
    async fn list_active(&self) -> AppResult<Vec<Entry>>;

    /// Direct fetch by id, including soft-deleted rows.
    async fn get(&self, id: i64) -> AppResult<Option<Entry>>;

    /// Fails with `Conflict` when an active entry already has the date.
    async fn create(&self, entry: &NewEntry) -> AppResult<Entry>;

    /// Overwrites the supplied fields and `modified_at`.
    async fn update(&self, id: i64, changes: &EntryChanges) -> AppResult<Entry>;

    async fn soft_delete(&self, id: i64) -> AppResult<Entry>;

    async fn exists_for_date(&self, date: NaiveDate) -> AppResult<bool>;

    /// Inserts the day's record or replaces its count.
    async fn record_steps(&self, date: NaiveDate, step_count: i64) -> AppResult<StepRecord>;

    async fn steps_for_date(&self, date: NaiveDate) -> AppResult<Option<StepRecord>>;

    /// Oldest first.
    async fn list_steps(&self) -> AppResult<Vec<StepRecord>>;

    async fn ping(&self) -> bool;
}

/// `EntryStore` over an sqlx pool. The SQL below is shared by the Postgres
/// and SQLite backends.
#[derive(Clone)]
pub struct SqlStore<DB: Database> {
    pool: Pool<DB>,
}

impl<DB: Database> SqlStore<DB> {
    pub fn new(pool: Pool<DB>) -> Self {
        Self { pool }
    }
}

macro_rules! select_entries {
    () => {
        r#"
        SELECT e.id, e.entry_date, e.entry_text, e.sentiment, e.mood, e.weather,
               e.temperature, e.image_path, e.topic, e.song, e.genre,
               e.created_at, e.modified_at, e.deleted_at, s.step_count AS steps
        FROM entries e
        LEFT JOIN steps s ON s.step_date = e.entry_date AND s.deleted_at IS NULL
        "#
    };
}

const LIST_ACTIVE: &str = concat!(
    select_entries!(),
    "WHERE e.deleted_at IS NULL ORDER BY e.entry_date DESC, e.id DESC"
);

const GET_BY_ID: &str = concat!(select_entries!(), "WHERE e.id = $1");

const INSERT_ENTRY: &str = r#"
    INSERT INTO entries (entry_date, entry_text, sentiment, mood, weather, temperature,
                         image_path, topic, song, genre, created_at, modified_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
    RETURNING id
"#;

const UPDATE_ENTRY: &str = r#"
    UPDATE entries SET
        entry_text = COALESCE($2, entry_text),
        sentiment = COALESCE($3, sentiment),
        mood = COALESCE($4, mood),
        weather = COALESCE($5, weather),
        temperature = COALESCE($6, temperature),
        image_path = COALESCE($7, image_path),
        topic = CASE WHEN $2 IS NOT NULL THEN $8 ELSE topic END,
        song = COALESCE($9, song),
        genre = COALESCE($10, genre),
        modified_at = $11
    WHERE id = $1 AND deleted_at IS NULL
    RETURNING id
"#;

const SOFT_DELETE_ENTRY: &str = r#"
    UPDATE entries SET modified_at = $2, deleted_at = $2
    WHERE id = $1 AND deleted_at IS NULL
    RETURNING id
"#;

const EXISTS_FOR_DATE: &str =
    "SELECT EXISTS(SELECT 1 FROM entries WHERE entry_date = $1 AND deleted_at IS NULL)";

const UPSERT_STEPS: &str = r#"
    INSERT INTO steps (step_date, step_count, created_at, modified_at)
    VALUES ($1, $2, $3, $3)
    ON CONFLICT (step_date) DO UPDATE SET
        step_count = excluded.step_count,
        modified_at = excluded.modified_at,
        deleted_at = NULL
    RETURNING id, step_date, step_count, created_at, modified_at, deleted_at
"#;

const STEPS_FOR_DATE: &str = r#"
    SELECT id, step_date, step_count, created_at, modified_at, deleted_at
    FROM steps WHERE step_date = $1 AND deleted_at IS NULL
"#;

const LIST_STEPS: &str = r#"
    SELECT id, step_date, step_count, created_at, modified_at, deleted_at
    FROM steps WHERE deleted_at IS NULL
    ORDER BY step_date ASC
"#;

fn entry_not_found() -> AppError {
    AppError::NotFound("Entry not found".into())
}

/// The partial unique index on `entries(entry_date)` closes the window between
/// the caller's `exists_for_date` check and the insert.
fn map_insert_error(err: sqlx::Error, date: NaiveDate) -> AppError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(format!("An entry already exists for {date}"))
        }
        other => AppError::Database(other),
    }
}

macro_rules! impl_entry_store {
    ($db:ty) => {
        #[async_trait]
        impl EntryStore for SqlStore<$db> {
            async fn list_active(&self) -> AppResult<Vec<Entry>> {
                let rows = sqlx::query_as::<_, EntryRow>(LIST_ACTIVE)
                    .fetch_all(&self.pool)
                    .await?;
                Ok(rows.into_iter().map(Entry::from).collect())
            }

            async fn get(&self, id: i64) -> AppResult<Option<Entry>> {
                let row = sqlx::query_as::<_, EntryRow>(GET_BY_ID)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
                Ok(row.map(Entry::from))
            }

            async fn create(&self, entry: &NewEntry) -> AppResult<Entry> {
                let id = sqlx::query_scalar::<_, i64>(INSERT_ENTRY)
                    .bind(entry.entry_date)
                    .bind(&entry.text)
                    .bind(entry.sentiment)
                    .bind(entry.mood.as_str())
                    .bind(&entry.weather)
                    .bind(entry.temperature)
                    .bind(&entry.image_path)
                    .bind(&entry.topic)
                    .bind(&entry.song)
                    .bind(&entry.genre)
                    .bind(Utc::now())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| map_insert_error(e, entry.entry_date))?;

                self.get(id).await?.ok_or_else(entry_not_found)
            }

            async fn update(&self, id: i64, changes: &EntryChanges) -> AppResult<Entry> {
                let updated = sqlx::query_scalar::<_, i64>(UPDATE_ENTRY)
                    .bind(id)
                    .bind(&changes.text)
                    .bind(changes.sentiment)
                    .bind(changes.mood.map(Mood::as_str))
                    .bind(&changes.weather)
                    .bind(changes.temperature)
                    .bind(&changes.image_path)
                    .bind(&changes.topic)
                    .bind(&changes.song)
                    .bind(&changes.genre)
                    .bind(Utc::now())
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or_else(entry_not_found)?;

                self.get(updated).await?.ok_or_else(entry_not_found)
            }

            async fn soft_delete(&self, id: i64) -> AppResult<Entry> {
                let deleted = sqlx::query_scalar::<_, i64>(SOFT_DELETE_ENTRY)
                    .bind(id)
                    .bind(Utc::now())
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or_else(entry_not_found)?;

                self.get(deleted).await?.ok_or_else(entry_not_found)
            }

            async fn exists_for_date(&self, date: NaiveDate) -> AppResult<bool> {
                let exists = sqlx::query_scalar::<_, bool>(EXISTS_FOR_DATE)
                    .bind(date)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(exists)
            }

            async fn record_steps(&self, date: NaiveDate, step_count: i64) -> AppResult<StepRecord> {
                let record = sqlx::query_as::<_, StepRecord>(UPSERT_STEPS)
                    .bind(date)
                    .bind(step_count)
                    .bind(Utc::now())
                    .fetch_one(&self.pool)
                    .await?;
                Ok(record)
            }

            async fn steps_for_date(&self, date: NaiveDate) -> AppResult<Option<StepRecord>> {
                let record = sqlx::query_as::<_, StepRecord>(STEPS_FOR_DATE)
                    .bind(date)
                    .fetch_optional(&self.pool)
                    .await?;
                Ok(record)
            }

            async fn list_steps(&self) -> AppResult<Vec<StepRecord>> {
                let records = sqlx::query_as::<_, StepRecord>(LIST_STEPS)
                    .fetch_all(&self.pool)
                    .await?;
                Ok(records)
            }

            async fn ping(&self) -> bool {
                sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
            }
        }
    };
}

impl_entry_store!(sqlx::Postgres);
impl_entry_store!(sqlx::Sqlite);
