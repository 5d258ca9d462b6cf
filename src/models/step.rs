use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StepRecord {
    pub id: i64,
    pub step_date: NaiveDate,
    pub step_count: i64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// POST /add_steps, as sent by the phone shortcut
#[derive(Debug, Deserialize, Validate)]
pub struct RecordStepsRequest {
    pub date: NaiveDate,

    #[validate(range(min = 0, max = 1000000, message = "Steps must be between 0 and 1000000"))]
    pub steps: i64,
}
