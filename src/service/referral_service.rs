// service/referral_service.rs
use std::sync::Arc;

use crate::{
    db::{error::StoreError, userdb::USERS_REFERRAL_CODE_KEY, RewardsStore},
    models::{
        pointsmodel::PointsCredit,
        referralmodel::{Referral, ReferrerSummary},
        usermodel::{NewUser, User},
    },
    service::{error::ServiceError, referral::generate_referral_code},
};

pub const REFERRAL_ACTIVITY: &str = "referral";
const MAX_CODE_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct ReferralService {
    store: Arc<dyn RewardsStore>,
    referral_bonus: i64,
}

impl ReferralService {
    pub fn new(store: Arc<dyn RewardsStore>, referral_bonus: i64) -> Self {
        Self {
            store,
            referral_bonus,
        }
    }

    /// Inserts a user with a fresh referral code. Code collisions are retried.
    pub async fn create_user(
        &self,
        external_id: &str,
        email: Option<String>,
        username: Option<String>,
    ) -> Result<User, ServiceError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let new_user = NewUser {
                external_id: external_id.to_string(),
                email: email.clone(),
                username: username.clone(),
                referral_code: generate_referral_code(),
            };

            match self.store.save_user(&new_user).await {
                Ok(user) => {
                    tracing::info!("Registered user {} with referral code {}", user.external_id, user.referral_code);
                    return Ok(user);
                }
                Err(StoreError::UniqueViolation(constraint)) if constraint == USERS_REFERRAL_CODE_KEY => {
                    tracing::warn!("Referral code collision on attempt {} for {}", attempt, external_id);
                }
                Err(StoreError::UniqueViolation(_)) => {
                    return Err(ServiceError::UserAlreadyExists(external_id.to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::UniqueViolation(USERS_REFERRAL_CODE_KEY.to_string()).into())
    }

    /// Resolves a referral code to its owner.
    pub async fn resolve_code(&self, code: &str) -> Result<User, ServiceError> {
        self.store
            .get_user_by_referral_code(code)
            .await?
            .ok_or_else(|| ServiceError::UnknownReferralCode(code.to_string()))
    }

    /// Links `referee_id` to the owner of `code` and pays the referrer, once per referee.
    pub async fn redeem(&self, referee_id: &str, code: &str) -> Result<Referral, ServiceError> {
        let referee = self
            .store
            .get_user(referee_id)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound(referee_id.to_string()))?;

        if referee.referral_code == code {
            return Err(ServiceError::SelfReferralNotAllowed);
        }

        if self.store.get_referral_by_referee(referee_id).await?.is_some() {
            return Err(ServiceError::ReferralAlreadyUsed(referee_id.to_string()));
        }

        let referrer = self.resolve_code(code).await?;
        if referrer.external_id == referee.external_id {
            return Err(ServiceError::SelfReferralNotAllowed);
        }

        let credit = PointsCredit::new(self.referral_bonus, REFERRAL_ACTIVITY);

        // The pre-check above is racy, the store's unique constraint is authoritative.
        let referral = self
            .store
            .create_referral_with_credit(&referrer.external_id, referee_id, &credit)
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => {
                    ServiceError::ReferralAlreadyUsed(referee_id.to_string())
                }
                StoreError::CheckViolation(_) => ServiceError::SelfReferralNotAllowed,
                other => other.into(),
            })?;

        tracing::info!(
            "Referral redeemed: {} referred {}, credited {} points",
            referral.referrer_id,
            referral.referee_id,
            credit.points
        );

        Ok(referral)
    }

    pub async fn referrer_summary(&self, user_id: &str) -> Result<ReferrerSummary, ServiceError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound(user_id.to_string()))?;

        let referees = self.store.get_referrals_by_referrer(user_id).await?;
        let points_history = self.store.get_points_history(user_id).await?;

        Ok(ReferrerSummary {
            referral_code: user.referral_code,
            points: user.points,
            referees: referees.into_iter().map(Into::into).collect(),
            points_history,
        })
    }
}
