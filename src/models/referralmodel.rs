use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pointsmodel::PointsHistory;

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Referral {
    pub id: Uuid,
    pub referrer_id: String,
    pub referee_id: String,
    /// Set exactly once, when the referee is whitelisted and the referrer is paid.
    pub whitelist_bonus_awarded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Referee {
    pub external_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Referral> for Referee {
    fn from(referral: Referral) -> Self {
        Referee {
            external_id: referral.referee_id,
            created_at: referral.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerSummary {
    pub referral_code: String,
    pub points: i64,
    pub referees: Vec<Referee>,
    pub points_history: Vec<PointsHistory>,
}
