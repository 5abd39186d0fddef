// db/referraldb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{db::DBClient, error::StoreError, ledgerdb::apply_credit};

use crate::models::{pointsmodel::PointsCredit, referralmodel::Referral};

pub const REFERRALS_REFEREE_KEY: &str = "referrals_referee_id_key";
pub const REFERRALS_NO_SELF_REFERRAL: &str = "referrals_no_self_referral";

#[async_trait]
pub trait ReferralExt {
    async fn get_referral_by_referee(
        &self,
        referee_id: &str,
    ) -> Result<Option<Referral>, StoreError>;

    /// Newest first.
    async fn get_referrals_by_referrer(
        &self,
        referrer_id: &str,
    ) -> Result<Vec<Referral>, StoreError>;

    async fn count_referrals(&self, referrer_id: &str) -> Result<i64, StoreError>;

    /// Inserts the edge and credits the referrer in one transaction. A referee that
    /// already has an edge is rejected by the store with `UniqueViolation`, and an edge
    /// from a user to themselves with `CheckViolation`.
    async fn create_referral_with_credit(
        &self,
        referrer_id: &str,
        referee_id: &str,
        credit: &PointsCredit,
    ) -> Result<Referral, StoreError>;

    /// Sets the edge's whitelist flag and credits its referrer in one transaction.
    /// Returns `None` (and credits nothing) when the flag was already set.
    async fn claim_whitelist_bonus(
        &self,
        referee_id: &str,
        credit: &PointsCredit,
    ) -> Result<Option<Referral>, StoreError>;
}

#[async_trait]
impl ReferralExt for DBClient {
    async fn get_referral_by_referee(
        &self,
        referee_id: &str,
    ) -> Result<Option<Referral>, StoreError> {
        self.timed(
            sqlx::query_as::<_, Referral>(
                r#"
                SELECT id, referrer_id, referee_id, whitelist_bonus_awarded_at, created_at
                FROM referrals
                WHERE referee_id = $1
                "#,
            )
            .bind(referee_id)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn get_referrals_by_referrer(
        &self,
        referrer_id: &str,
    ) -> Result<Vec<Referral>, StoreError> {
        self.timed(
            sqlx::query_as::<_, Referral>(
                r#"
                SELECT id, referrer_id, referee_id, whitelist_bonus_awarded_at, created_at
                FROM referrals
                WHERE referrer_id = $1
                ORDER BY created_at DESC
                "#,
            )
            .bind(referrer_id)
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn count_referrals(&self, referrer_id: &str) -> Result<i64, StoreError> {
        self.timed(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM referrals WHERE referrer_id = $1")
                .bind(referrer_id)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn create_referral_with_credit(
        &self,
        referrer_id: &str,
        referee_id: &str,
        credit: &PointsCredit,
    ) -> Result<Referral, StoreError> {
        self.timed(async {
            let mut tx = self.pool.begin().await?;

            let referral = sqlx::query_as::<_, Referral>(
                r#"
                INSERT INTO referrals (id, referrer_id, referee_id)
                VALUES ($1, $2, $3)
                RETURNING id, referrer_id, referee_id, whitelist_bonus_awarded_at, created_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(referrer_id)
            .bind(referee_id)
            .fetch_one(&mut *tx)
            .await?;

            apply_credit(&mut *tx, referrer_id, credit).await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(referral)
        })
        .await
    }

    async fn claim_whitelist_bonus(
        &self,
        referee_id: &str,
        credit: &PointsCredit,
    ) -> Result<Option<Referral>, StoreError> {
        self.timed(async {
            let mut tx = self.pool.begin().await?;

            // The row lock makes a concurrent claim re-check the predicate and find nothing.
            let claimed = sqlx::query_as::<_, Referral>(
                r#"
                UPDATE referrals
                SET whitelist_bonus_awarded_at = NOW()
                WHERE referee_id = $1 AND whitelist_bonus_awarded_at IS NULL
                RETURNING id, referrer_id, referee_id, whitelist_bonus_awarded_at, created_at
                "#,
            )
            .bind(referee_id)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(referral) = claimed else {
                tx.rollback().await?;
                return Ok(None);
            };

            apply_credit(&mut *tx, &referral.referrer_id, credit).await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(Some(referral))
        })
        .await
    }
}
