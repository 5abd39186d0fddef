use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One append-only ledger entry.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct PointsHistory {
    pub id: Uuid,
    pub user_id: String,
    pub points: i64,
    pub activity: String,
    pub created_at: DateTime<Utc>,
}

/// A relative balance adjustment. The store applies it as `points = points + delta`
/// together with the matching history entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsCredit {
    pub points: i64,
    pub activity: String,
}

impl PointsCredit {
    pub fn new(points: i64, activity: impl Into<String>) -> Self {
        Self {
            points,
            activity: activity.into(),
        }
    }
}
