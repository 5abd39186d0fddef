// service/invite_checker.rs
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    db::RewardsStore,
    models::questmodel::{Quest, QuestAction},
    service::{error::ServiceError, quest_checker::QuestChecker},
};

/// Parses an INVITE tier's string target.
pub fn parse_target(quest: &Quest) -> Result<i64, ServiceError> {
    quest
        .target
        .trim()
        .parse::<i64>()
        .map_err(|_| ServiceError::MalformedQuestTarget {
            quest_id: quest.id,
            target: quest.target.clone(),
        })
}

/// Satisfied when this tier is the user's next one: confirmed invites + 1 == target.
pub struct InviteTierChecker {
    store: Arc<dyn RewardsStore>,
}

impl InviteTierChecker {
    pub fn new(store: Arc<dyn RewardsStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl QuestChecker for InviteTierChecker {
    async fn is_quest_completed(&self, quest: &Quest, user_id: &str) -> Result<bool, ServiceError> {
        if quest.action != QuestAction::Invite {
            return Err(ServiceError::UnsupportedAction {
                platform: quest.platform.clone(),
                action: quest.action.clone(),
            });
        }

        let target = parse_target(quest)?;
        let confirmed = self.store.count_completed_invite_quests(user_id).await?;

        tracing::debug!(
            "Invite tier check for {}: quest {} target {}, confirmed invites {}",
            user_id,
            quest.id,
            target,
            confirmed
        );

        Ok(confirmed + 1 == target)
    }
}
