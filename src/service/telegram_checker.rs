// service/telegram_checker.rs
use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    config::Config,
    models::questmodel::{Quest, QuestAction},
    service::{error::ServiceError, quest_checker::QuestChecker},
};

const MEMBER_STATUSES: [&str; 3] = ["member", "administrator", "creator"];

/// Messaging-platform membership lookup.
#[async_trait]
pub trait MembershipLookup: Send + Sync {
    /// The user's raw membership status in `chat_id`, e.g. "member" or "left".
    async fn chat_member_status(&self, chat_id: &str, user_id: &str) -> Result<String, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct ChatMemberResponse {
    ok: bool,
    result: Option<ChatMember>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    status: String,
}

/// Telegram Bot API client for `getChatMember`.
pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl TelegramClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            api_base: config.telegram_api_base.trim_end_matches('/').to_string(),
            bot_token: config.telegram_bot_token.clone(),
        })
    }
}

#[async_trait]
impl MembershipLookup for TelegramClient {
    async fn chat_member_status(&self, chat_id: &str, user_id: &str) -> Result<String, ServiceError> {
        // The URL carries the bot token, keep it out of logs and errors.
        let url = format!("{}/bot{}/getChatMember", self.api_base, self.bot_token);

        let response = self
            .http
            .get(&url)
            .query(&[("chat_id", chat_id), ("user_id", user_id)])
            .send()
            .await
            .map_err(|e| {
                ServiceError::CheckerUnavailable(format!(
                    "getChatMember request failed: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::CheckerUnavailable(format!(
                "getChatMember returned {}",
                status
            )));
        }

        let body: ChatMemberResponse = response.json().await.map_err(|e| {
            ServiceError::CheckerUnavailable(format!(
                "invalid getChatMember response: {}",
                e.without_url()
            ))
        })?;

        if !body.ok {
            return Err(ServiceError::CheckerUnavailable(format!(
                "telegram API returned error: {}",
                body.description.unwrap_or_default()
            )));
        }

        body.result.map(|member| member.status).ok_or_else(|| {
            ServiceError::CheckerUnavailable("getChatMember response has no result".to_string())
        })
    }
}

/// Satisfied when the user is a member, administrator or creator of the configured group.
pub struct GroupMembershipChecker {
    lookup: Arc<dyn MembershipLookup>,
    chat_id: String,
}

impl GroupMembershipChecker {
    pub fn new(lookup: Arc<dyn MembershipLookup>, chat_id: impl Into<String>) -> Self {
        Self {
            lookup,
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl QuestChecker for GroupMembershipChecker {
    async fn is_quest_completed(&self, quest: &Quest, user_id: &str) -> Result<bool, ServiceError> {
        if quest.action != QuestAction::Group {
            return Err(ServiceError::UnsupportedAction {
                platform: quest.platform.clone(),
                action: quest.action.clone(),
            });
        }

        let status = self.lookup.chat_member_status(&self.chat_id, user_id).await?;
        tracing::debug!(
            "Group membership for {} in {}: {}",
            user_id,
            self.chat_id,
            status
        );

        Ok(MEMBER_STATUSES.contains(&status.as_str()))
    }
}
