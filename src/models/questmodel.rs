use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a quest asks the user to do. Labels outside the known set are kept verbatim
/// so a checker can still be registered for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestAction {
    Group,
    Invite,
    Other(String),
}

impl QuestAction {
    pub fn as_str(&self) -> &str {
        match self {
            QuestAction::Group => "GROUP",
            QuestAction::Invite => "INVITE",
            QuestAction::Other(label) => label.as_str(),
        }
    }
}

impl From<String> for QuestAction {
    fn from(label: String) -> Self {
        match label.trim().to_uppercase().as_str() {
            "GROUP" => QuestAction::Group,
            "INVITE" => QuestAction::Invite,
            other => QuestAction::Other(other.to_string()),
        }
    }
}

impl From<&str> for QuestAction {
    fn from(label: &str) -> Self {
        QuestAction::from(label.to_string())
    }
}

impl From<QuestAction> for String {
    fn from(action: QuestAction) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for QuestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Quest {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub platform: String,
    #[sqlx(try_from = "String")]
    pub action: QuestAction,
    /// Numeric for INVITE tiers, a platform-specific value otherwise.
    pub target: String,
    pub points: i64,
    pub message: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Quest {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }

    /// Label written to the points history when this quest pays out.
    pub fn activity_label(&self) -> String {
        match &self.message {
            Some(message) if !message.trim().is_empty() => message.clone(),
            _ => format!("Completed quest: {}", self.title),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct QuestCompletion {
    pub id: Uuid,
    pub user_id: String,
    pub quest_id: i64,
    pub fully_completed: bool,
    pub created_at: DateTime<Utc>,
}

/// A quest as listed to one user, with their invite progress on INVITE quests.
#[derive(Debug, Serialize, Clone)]
pub struct QuestView {
    #[serde(flatten)]
    pub quest: Quest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<i64>,
}
