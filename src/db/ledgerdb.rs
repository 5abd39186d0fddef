// db/ledgerdb.rs
use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{db::DBClient, error::StoreError};

use crate::models::pointsmodel::{PointsCredit, PointsHistory};

#[async_trait]
pub trait LedgerExt {
    /// Appends a history entry and adds `credit.points` to the user's balance as one unit.
    async fn credit_points(
        &self,
        user_id: &str,
        credit: &PointsCredit,
    ) -> Result<PointsHistory, StoreError>;

    /// Newest first.
    async fn get_points_history(&self, user_id: &str) -> Result<Vec<PointsHistory>, StoreError>;
}

/// Relative-delta credit on an open connection or transaction. Fails with `RowNotFound`
/// when the user does not exist, so the caller's transaction never commits a dangling entry.
pub(crate) async fn apply_credit(
    conn: &mut PgConnection,
    user_id: &str,
    credit: &PointsCredit,
) -> Result<PointsHistory, sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET points = points + $1, updated_at = NOW()
        WHERE external_id = $2
        RETURNING points
        "#,
    )
    .bind(credit.points)
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query_as::<_, PointsHistory>(
        r#"
        INSERT INTO points_history (id, user_id, points, activity)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, points, activity, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(credit.points)
    .bind(&credit.activity)
    .fetch_one(&mut *conn)
    .await
}

#[async_trait]
impl LedgerExt for DBClient {
    async fn credit_points(
        &self,
        user_id: &str,
        credit: &PointsCredit,
    ) -> Result<PointsHistory, StoreError> {
        self.timed(async {
            let mut tx = self.pool.begin().await?;
            let entry = apply_credit(&mut *tx, user_id, credit).await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(entry)
        })
        .await
    }

    async fn get_points_history(&self, user_id: &str) -> Result<Vec<PointsHistory>, StoreError> {
        self.timed(
            sqlx::query_as::<_, PointsHistory>(
                r#"
                SELECT id, user_id, points, activity, created_at
                FROM points_history
                WHERE user_id = $1
                ORDER BY created_at DESC
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await
    }
}
