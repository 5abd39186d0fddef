// service/rewards_engine.rs
use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::{
    config::RewardsConfig,
    db::RewardsStore,
    models::{
        questmodel::{Quest, QuestCompletion, QuestView},
        referralmodel::{Referral, ReferrerSummary},
        usermodel::User,
    },
    service::{
        error::ServiceError,
        quest_checker::QuestCheckerRegistry,
        quest_service::{QuestService, TierOutcome},
        referral_service::ReferralService,
        whitelist_service::{WhitelistOutcome, WhitelistService},
    },
};

#[derive(Debug, Clone, Serialize)]
pub struct RedemptionOutcome {
    pub referral: Referral,
    pub tier: TierOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral: Option<RedemptionOutcome>,
}

/// The operations exposed to the front door. Every call is independent and holds no
/// in-process state beyond the injected store and checkers.
#[derive(Clone)]
pub struct RewardsEngine {
    referrals: ReferralService,
    quests: QuestService,
    whitelist: WhitelistService,
}

impl fmt::Debug for RewardsEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewardsEngine").finish_non_exhaustive()
    }
}

impl RewardsEngine {
    pub fn new(
        store: Arc<dyn RewardsStore>,
        registry: Arc<QuestCheckerRegistry>,
        rewards: &RewardsConfig,
    ) -> Self {
        Self {
            referrals: ReferralService::new(store.clone(), rewards.referral_bonus),
            quests: QuestService::new(store.clone(), registry),
            whitelist: WhitelistService::new(store, rewards.whitelist_bonus),
        }
    }

    /// Creates the user, then redeems `referral_code` if one was given. An unknown code
    /// is rejected before the user is written.
    pub async fn register_user(
        &self,
        external_id: &str,
        email: Option<String>,
        username: Option<String>,
        referral_code: Option<&str>,
    ) -> Result<Registration, ServiceError> {
        if let Some(code) = referral_code {
            self.referrals.resolve_code(code).await?;
        }

        let user = self.referrals.create_user(external_id, email, username).await?;

        let referral = match referral_code {
            Some(code) => Some(self.redeem_referral(&user.external_id, code).await?),
            None => None,
        };

        Ok(Registration { user, referral })
    }

    /// Redeems the code, then advances the referrer's invite tier. Once the referral is
    /// committed the call succeeds; a failed tier step comes back as `TierOutcome::Deferred`.
    pub async fn redeem_referral(
        &self,
        referee_id: &str,
        code: &str,
    ) -> Result<RedemptionOutcome, ServiceError> {
        let referral = self.referrals.redeem(referee_id, code).await?;

        let tier = match self.quests.advance_invite_tier(&referral.referrer_id).await {
            Ok(tier) => tier,
            Err(e) => {
                tracing::warn!(
                    "Invite tier for {} deferred after referral of {}: {}",
                    referral.referrer_id,
                    referral.referee_id,
                    e
                );
                TierOutcome::Deferred {
                    reason: e.to_string(),
                }
            }
        };

        Ok(RedemptionOutcome { referral, tier })
    }

    pub async fn complete_quest(
        &self,
        user_id: &str,
        quest_id: i64,
    ) -> Result<QuestCompletion, ServiceError> {
        self.quests.complete_quest(user_id, quest_id).await
    }

    pub async fn advance_invite_tier(&self, referrer_id: &str) -> Result<TierOutcome, ServiceError> {
        self.quests.advance_invite_tier(referrer_id).await
    }

    pub async fn whitelist(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<WhitelistOutcome, ServiceError> {
        self.whitelist.whitelist(user_id, email).await
    }

    pub async fn list_active_quests(&self) -> Result<Vec<Quest>, ServiceError> {
        self.quests.list_active_quests().await
    }

    pub async fn list_active_quests_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<QuestView>, ServiceError> {
        self.quests.list_active_quests_for_user(user_id).await
    }

    pub async fn get_referrer_summary(&self, user_id: &str) -> Result<ReferrerSummary, ServiceError> {
        self.referrals.referrer_summary(user_id).await
    }
}
