// db/userdb.rs
use async_trait::async_trait;

use super::{db::DBClient, error::StoreError};

use crate::models::usermodel::{NewUser, User};

pub const USERS_PKEY: &str = "users_pkey";
pub const USERS_REFERRAL_CODE_KEY: &str = "users_referral_code_key";

#[async_trait]
pub trait UserExt {
    async fn get_user(&self, external_id: &str) -> Result<Option<User>, StoreError>;

    async fn get_user_by_referral_code(
        &self,
        referral_code: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Fails with `UniqueViolation(USERS_PKEY)` for a taken external id and
    /// `UniqueViolation(USERS_REFERRAL_CODE_KEY)` for a colliding code.
    async fn save_user(&self, new_user: &NewUser) -> Result<User, StoreError>;

    /// Marks the user whitelisted and records their email. `None` if the user does not exist.
    async fn whitelist_user(
        &self,
        external_id: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        self.timed(
            sqlx::query_as::<_, User>(
                r#"
                SELECT external_id, email, username, referral_code, points, whitelisted,
                    created_at, updated_at
                FROM users
                WHERE external_id = $1
                "#,
            )
            .bind(external_id)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn get_user_by_referral_code(
        &self,
        referral_code: &str,
    ) -> Result<Option<User>, StoreError> {
        self.timed(
            sqlx::query_as::<_, User>(
                r#"
                SELECT external_id, email, username, referral_code, points, whitelisted,
                    created_at, updated_at
                FROM users
                WHERE referral_code = $1
                "#,
            )
            .bind(referral_code)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn save_user(&self, new_user: &NewUser) -> Result<User, StoreError> {
        self.timed(
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (external_id, email, username, referral_code)
                VALUES ($1, $2, $3, $4)
                RETURNING external_id, email, username, referral_code, points, whitelisted,
                    created_at, updated_at
                "#,
            )
            .bind(&new_user.external_id)
            .bind(&new_user.email)
            .bind(&new_user.username)
            .bind(&new_user.referral_code)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn whitelist_user(
        &self,
        external_id: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        self.timed(
            sqlx::query_as::<_, User>(
                r#"
                UPDATE users
                SET whitelisted = TRUE, email = $1, updated_at = NOW()
                WHERE external_id = $2
                RETURNING external_id, email, username, referral_code, points, whitelisted,
                    created_at, updated_at
                "#,
            )
            .bind(email)
            .bind(external_id)
            .fetch_optional(&self.pool),
        )
        .await
    }
}
