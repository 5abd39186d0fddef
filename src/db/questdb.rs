// db/questdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{db::DBClient, error::StoreError, ledgerdb::apply_credit};

use crate::models::{
    pointsmodel::PointsCredit,
    questmodel::{Quest, QuestAction, QuestCompletion},
};

pub const QUEST_COMPLETIONS_ONCE_IDX: &str = "quest_completions_user_quest_once";

#[async_trait]
pub trait QuestExt {
    async fn get_quest(&self, quest_id: i64) -> Result<Option<Quest>, StoreError>;

    /// Quests with no expiry or an expiry in the future, ordered by id.
    async fn get_active_quests(&self) -> Result<Vec<Quest>, StoreError>;

    /// Active quests with the given action, ordered by id.
    async fn get_quests_by_action(&self, action: &QuestAction) -> Result<Vec<Quest>, StoreError>;

    /// Number of INVITE tiers the user has fully completed.
    async fn count_completed_invite_quests(&self, user_id: &str) -> Result<i64, StoreError>;

    async fn get_completed_quest_ids(&self, user_id: &str) -> Result<Vec<i64>, StoreError>;

    async fn has_completed_quest(&self, user_id: &str, quest_id: i64) -> Result<bool, StoreError>;

    /// Writes the completion row and, when `credit` is given, credits the user in the
    /// same transaction. A second fully-completed row for the same quest is rejected
    /// with `UniqueViolation`.
    async fn record_quest_completion(
        &self,
        user_id: &str,
        quest_id: i64,
        fully_completed: bool,
        credit: Option<&PointsCredit>,
    ) -> Result<QuestCompletion, StoreError>;
}

#[async_trait]
impl QuestExt for DBClient {
    async fn get_quest(&self, quest_id: i64) -> Result<Option<Quest>, StoreError> {
        self.timed(
            sqlx::query_as::<_, Quest>(
                r#"
                SELECT id, title, description, platform, action, target, points, message,
                    expires_at, created_at
                FROM quests
                WHERE id = $1
                "#,
            )
            .bind(quest_id)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn get_active_quests(&self) -> Result<Vec<Quest>, StoreError> {
        self.timed(
            sqlx::query_as::<_, Quest>(
                r#"
                SELECT id, title, description, platform, action, target, points, message,
                    expires_at, created_at
                FROM quests
                WHERE expires_at IS NULL OR expires_at > NOW()
                ORDER BY id ASC
                "#,
            )
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn get_quests_by_action(&self, action: &QuestAction) -> Result<Vec<Quest>, StoreError> {
        self.timed(
            sqlx::query_as::<_, Quest>(
                r#"
                SELECT id, title, description, platform, action, target, points, message,
                    expires_at, created_at
                FROM quests
                WHERE action = $1 AND (expires_at IS NULL OR expires_at > NOW())
                ORDER BY id ASC
                "#,
            )
            .bind(action.as_str())
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn count_completed_invite_quests(&self, user_id: &str) -> Result<i64, StoreError> {
        self.timed(
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*)
                FROM quest_completions c
                JOIN quests q ON q.id = c.quest_id
                WHERE c.user_id = $1 AND c.fully_completed AND q.action = $2
                "#,
            )
            .bind(user_id)
            .bind(QuestAction::Invite.as_str())
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn get_completed_quest_ids(&self, user_id: &str) -> Result<Vec<i64>, StoreError> {
        self.timed(
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT quest_id
                FROM quest_completions
                WHERE user_id = $1 AND fully_completed
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn has_completed_quest(&self, user_id: &str, quest_id: i64) -> Result<bool, StoreError> {
        self.timed(
            sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM quest_completions
                    WHERE user_id = $1 AND quest_id = $2 AND fully_completed
                )
                "#,
            )
            .bind(user_id)
            .bind(quest_id)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn record_quest_completion(
        &self,
        user_id: &str,
        quest_id: i64,
        fully_completed: bool,
        credit: Option<&PointsCredit>,
    ) -> Result<QuestCompletion, StoreError> {
        self.timed(async {
            let mut tx = self.pool.begin().await?;

            let completion = sqlx::query_as::<_, QuestCompletion>(
                r#"
                INSERT INTO quest_completions (id, user_id, quest_id, fully_completed)
                VALUES ($1, $2, $3, $4)
                RETURNING id, user_id, quest_id, fully_completed, created_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(quest_id)
            .bind(fully_completed)
            .fetch_one(&mut *tx)
            .await?;

            if let Some(credit) = credit {
                apply_credit(&mut *tx, user_id, credit).await?;
            }

            tx.commit().await?;
            Ok::<_, sqlx::Error>(completion)
        })
        .await
    }
}
