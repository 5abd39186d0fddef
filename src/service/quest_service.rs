// service/quest_service.rs
use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use serde::Serialize;

use crate::{
    db::{error::StoreError, RewardsStore},
    models::{
        pointsmodel::PointsCredit,
        questmodel::{Quest, QuestAction, QuestCompletion, QuestView},
    },
    service::{
        error::ServiceError, invite_checker::parse_target, quest_checker::QuestCheckerRegistry,
    },
};

/// Result of one invite-tier evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TierOutcome {
    /// No INVITE quests, or the referrer is past the last tier.
    NoTier,
    /// The tier was evaluated and a completion row written with the result.
    Evaluated { quest_id: i64, completed: bool },
    /// A concurrent evaluation already paid this tier.
    AlreadyClaimed { quest_id: i64 },
    /// The evaluation failed after the triggering referral was committed. The tier
    /// is picked up again on the next referral or an explicit advance.
    Deferred { reason: String },
}

/// Picks the tier to evaluate for a referrer with `count` confirmed referrals:
/// the smallest target strictly above `count`, unless `count` is past the largest target.
/// `tiers` must be sorted ascending by target.
pub fn select_invite_tier(tiers: &[(i64, Quest)], count: i64) -> Option<&Quest> {
    let (largest, _) = tiers.last()?;
    if count > *largest {
        return None;
    }
    tiers
        .iter()
        .find(|(target, _)| *target > count)
        .map(|(_, quest)| quest)
}

#[derive(Clone)]
pub struct QuestService {
    store: Arc<dyn RewardsStore>,
    registry: Arc<QuestCheckerRegistry>,
}

impl QuestService {
    pub fn new(store: Arc<dyn RewardsStore>, registry: Arc<QuestCheckerRegistry>) -> Self {
        Self { store, registry }
    }

    pub async fn list_active_quests(&self) -> Result<Vec<Quest>, ServiceError> {
        Ok(self.store.get_active_quests().await?)
    }

    /// Active quests the user has not fully completed. INVITE quests carry the
    /// user's confirmed invite count as progress.
    pub async fn list_active_quests_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<QuestView>, ServiceError> {
        let quests = self.store.get_active_quests().await?;
        let completed: HashSet<i64> = self
            .store
            .get_completed_quest_ids(user_id)
            .await?
            .into_iter()
            .collect();

        let invite_progress = if quests.iter().any(|q| q.action == QuestAction::Invite) {
            self.store.count_completed_invite_quests(user_id).await?
        } else {
            0
        };

        Ok(quests
            .into_iter()
            .filter(|quest| !completed.contains(&quest.id))
            .map(|quest| {
                let progress = (quest.action == QuestAction::Invite).then_some(invite_progress);
                QuestView { quest, progress }
            })
            .collect())
    }

    /// Finalizes a quest for `user_id` if its checker is satisfied. A false predicate
    /// writes nothing, so the caller can retry later.
    pub async fn complete_quest(
        &self,
        user_id: &str,
        quest_id: i64,
    ) -> Result<QuestCompletion, ServiceError> {
        let quest = self
            .store
            .get_quest(quest_id)
            .await?
            .ok_or(ServiceError::QuestNotFound(quest_id))?;

        // Tiers are judged against the referral count, which only advance_invite_tier reads.
        if quest.action == QuestAction::Invite {
            return Err(ServiceError::InviteQuestNotDirectlyCompletable(quest_id));
        }

        if !quest.is_active_at(Utc::now()) {
            return Err(ServiceError::QuestExpired(quest_id));
        }

        if self.store.get_user(user_id).await?.is_none() {
            return Err(ServiceError::UserNotFound(user_id.to_string()));
        }

        if self.store.has_completed_quest(user_id, quest_id).await? {
            return Err(already_completed(user_id, quest_id));
        }

        if !self.registry.evaluate(&quest, user_id).await? {
            tracing::debug!("Quest {} not completed by {}", quest_id, user_id);
            return Err(ServiceError::QuestNotCompleted {
                user_id: user_id.to_string(),
                quest_id,
            });
        }

        let credit = PointsCredit::new(quest.points, quest.activity_label());
        let completion = self
            .store
            .record_quest_completion(user_id, quest_id, true, Some(&credit))
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => already_completed(user_id, quest_id),
                other => other.into(),
            })?;

        tracing::info!(
            "Quest {} completed by {}, credited {} points",
            quest_id,
            user_id,
            credit.points
        );

        Ok(completion)
    }

    /// Evaluates the referrer's current invite tier and records the result. Runs after
    /// every referral, so tiers advance lazily with no background sweep.
    pub async fn advance_invite_tier(&self, referrer_id: &str) -> Result<TierOutcome, ServiceError> {
        let mut tiers = Vec::new();
        for quest in self.store.get_quests_by_action(&QuestAction::Invite).await? {
            tiers.push((parse_target(&quest)?, quest));
        }
        tiers.sort_by_key(|(target, quest)| (*target, quest.id));

        let count = self.store.count_referrals(referrer_id).await?;

        let Some(quest) = select_invite_tier(&tiers, count) else {
            tracing::debug!("No invite tier left for {} at {} referrals", referrer_id, count);
            return Ok(TierOutcome::NoTier);
        };

        let completed = self.registry.evaluate(quest, referrer_id).await?;
        let credit = completed.then(|| PointsCredit::new(quest.points, quest.activity_label()));

        match self
            .store
            .record_quest_completion(referrer_id, quest.id, completed, credit.as_ref())
            .await
        {
            Ok(_) => {
                tracing::info!(
                    "Invite tier {} (target {}) evaluated for {} at {} referrals: completed={}",
                    quest.id,
                    quest.target,
                    referrer_id,
                    count,
                    completed
                );
                Ok(TierOutcome::Evaluated {
                    quest_id: quest.id,
                    completed,
                })
            }
            Err(StoreError::UniqueViolation(_)) => {
                tracing::info!("Invite tier {} already claimed by {}", quest.id, referrer_id);
                Ok(TierOutcome::AlreadyClaimed { quest_id: quest.id })
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn already_completed(user_id: &str, quest_id: i64) -> ServiceError {
    ServiceError::QuestAlreadyCompleted {
        user_id: user_id.to_string(),
        quest_id,
    }
}
