// service/whitelist_service.rs
use std::sync::Arc;

use serde::Serialize;

use crate::{
    db::RewardsStore,
    models::pointsmodel::PointsCredit,
    service::error::ServiceError,
};

pub const WHITELIST_ACTIVITY: &str = "Your friend signed up for the whitelist";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WhitelistOutcome {
    /// Whitelisted, but nobody referred this user.
    NoReferrer,
    Awarded { referrer_id: String },
    /// The referrer was already paid for this referee.
    AlreadyAwarded { referrer_id: String },
}

#[derive(Clone)]
pub struct WhitelistService {
    store: Arc<dyn RewardsStore>,
    whitelist_bonus: i64,
}

impl WhitelistService {
    pub fn new(store: Arc<dyn RewardsStore>, whitelist_bonus: i64) -> Self {
        Self {
            store,
            whitelist_bonus,
        }
    }

    /// Marks the user whitelisted and pays their referrer, at most once per referee.
    pub async fn whitelist(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<WhitelistOutcome, ServiceError> {
        self.store
            .whitelist_user(user_id, email)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound(user_id.to_string()))?;

        let Some(referral) = self.store.get_referral_by_referee(user_id).await? else {
            tracing::info!("User {} whitelisted without a referrer", user_id);
            return Ok(WhitelistOutcome::NoReferrer);
        };

        let credit = PointsCredit::new(self.whitelist_bonus, WHITELIST_ACTIVITY);
        match self.store.claim_whitelist_bonus(user_id, &credit).await? {
            Some(claimed) => {
                tracing::info!(
                    "Whitelist bonus of {} points paid to {} for {}",
                    credit.points,
                    claimed.referrer_id,
                    user_id
                );
                Ok(WhitelistOutcome::Awarded {
                    referrer_id: claimed.referrer_id,
                })
            }
            None => {
                tracing::debug!("Whitelist bonus for {} already paid", user_id);
                Ok(WhitelistOutcome::AlreadyAwarded {
                    referrer_id: referral.referrer_id,
                })
            }
        }
    }
}
