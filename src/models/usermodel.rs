use chrono::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub external_id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub referral_code: String,
    /// Maintained by the ledger's atomic credit; never written directly.
    pub points: i64,
    pub whitelisted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub external_id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub referral_code: String,
}
