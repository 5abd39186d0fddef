// service/quest_checker.rs
use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;

use crate::{
    db::RewardsStore,
    models::questmodel::{Quest, QuestAction},
    service::{
        error::ServiceError,
        invite_checker::InviteTierChecker,
        telegram_checker::{GroupMembershipChecker, MembershipLookup},
    },
};

pub const PAY3_PLATFORM: &str = "pay3";
pub const TELEGRAM_PLATFORM: &str = "telegram";

/// A read-only completion predicate for one (platform, action) pair.
#[async_trait]
pub trait QuestChecker: Send + Sync {
    async fn is_quest_completed(&self, quest: &Quest, user_id: &str) -> Result<bool, ServiceError>;
}

/// Always satisfied. Only bound to pairs an operator lists explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfAttestedChecker;

#[async_trait]
impl QuestChecker for SelfAttestedChecker {
    async fn is_quest_completed(&self, _quest: &Quest, _user_id: &str) -> Result<bool, ServiceError> {
        Ok(true)
    }
}

/// Dispatches a quest to the checker bound to its platform and action.
#[derive(Clone, Default)]
pub struct QuestCheckerRegistry {
    checkers: HashMap<String, HashMap<QuestAction, Arc<dyn QuestChecker>>>,
}

impl fmt::Debug for QuestCheckerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bindings: Vec<String> = self
            .checkers
            .iter()
            .flat_map(|(platform, actions)| {
                actions
                    .keys()
                    .map(move |action| format!("{}:{}", platform, action))
            })
            .collect();
        bindings.sort();
        f.debug_struct("QuestCheckerRegistry")
            .field("bindings", &bindings)
            .finish()
    }
}

impl QuestCheckerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invite tiers on pay3, group membership on telegram, plus any self-attested pairs.
    pub fn with_defaults(
        store: Arc<dyn RewardsStore>,
        membership: Arc<dyn MembershipLookup>,
        group_chat_id: &str,
        self_attested: &[(String, QuestAction)],
    ) -> Self {
        let mut registry = Self::new();
        registry.register(
            PAY3_PLATFORM,
            QuestAction::Invite,
            Arc::new(InviteTierChecker::new(store)),
        );
        registry.register(
            TELEGRAM_PLATFORM,
            QuestAction::Group,
            Arc::new(GroupMembershipChecker::new(membership, group_chat_id)),
        );
        for (platform, action) in self_attested {
            registry.register(platform.clone(), action.clone(), Arc::new(SelfAttestedChecker));
        }
        registry
    }

    /// Binds `checker` to the pair, replacing any previous binding.
    pub fn register(
        &mut self,
        platform: impl Into<String>,
        action: QuestAction,
        checker: Arc<dyn QuestChecker>,
    ) -> &mut Self {
        let platform = platform.into();
        tracing::debug!("Registering quest checker for {}:{}", platform, action);
        self.checkers
            .entry(platform)
            .or_default()
            .insert(action, checker);
        self
    }

    pub async fn evaluate(&self, quest: &Quest, user_id: &str) -> Result<bool, ServiceError> {
        let by_action = self
            .checkers
            .get(&quest.platform)
            .ok_or_else(|| ServiceError::UnsupportedPlatform(quest.platform.clone()))?;

        let checker = by_action
            .get(&quest.action)
            .ok_or_else(|| ServiceError::UnsupportedAction {
                platform: quest.platform.clone(),
                action: quest.action.clone(),
            })?;

        checker.is_quest_completed(quest, user_id).await
    }
}
