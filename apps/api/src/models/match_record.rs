use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::matching::scoring::MatchStatus;

/// One persisted scoring request. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MatchRecord {
    pub id: i64,
    pub jd_text: String,
    pub cv_text: String,
    pub score: f64,
    pub status: MatchStatus,
    /// Threshold in force when the status was derived.
    pub threshold: f64,
    pub created_at: DateTime<Utc>,
}
