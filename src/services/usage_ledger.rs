use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{EntryId, FeatureCategory, UsageEntry};
use crate::quota::{Clock, ConditionalRecord, QuotaError, UsageLedger};

/// PostgreSQL-backed usage ledger
#[derive(Clone)]
pub struct PgUsageLedger {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgUsageLedger {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Lists a user's entries in one category, newest first
    pub async fn list_for_user(
        &self,
        user_id: i32,
        category: FeatureCategory,
    ) -> Result<Vec<UsageEntry>, QuotaError> {
        let entries = sqlx::query_as::<_, UsageEntry>(
            r#"
            SELECT id, user_id, category, created_at
            FROM usage_entries
            WHERE user_id = $1 AND category = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn count_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
        category: FeatureCategory,
        boundary: DateTime<Utc>,
    ) -> Result<i64, QuotaError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM usage_entries
            WHERE user_id = $1 AND category = $2 AND created_at >= $3
            "#,
        )
        .bind(user_id)
        .bind(category)
        .bind(boundary)
        .fetch_one(&mut **tx)
        .await?;
        Ok(count)
    }

    async fn insert_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        entry_id: EntryId,
        user_id: i32,
        category: FeatureCategory,
        created_at: DateTime<Utc>,
    ) -> Result<(), QuotaError> {
        sqlx::query(
            r#"
            INSERT INTO usage_entries (id, user_id, category, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .bind(category)
        .bind(created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Count-then-insert under the (user, category) lock
    async fn record_if_below_inner(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
        category: FeatureCategory,
        boundary: DateTime<Utc>,
        limit: i64,
    ) -> Result<ConditionalRecord, QuotaError> {
        let used = Self::count_in_tx(tx, user_id, category, boundary).await?;
        if used >= limit {
            return Ok(ConditionalRecord::LimitReached { used });
        }

        let entry_id = Uuid::new_v4();
        Self::insert_in_tx(tx, entry_id, user_id, category, self.clock.now()).await?;

        Ok(ConditionalRecord::Recorded {
            entry_id,
            used: used + 1,
        })
    }
}

#[async_trait]
impl UsageLedger for PgUsageLedger {
    async fn record(
        &self,
        user_id: i32,
        category: FeatureCategory,
    ) -> Result<EntryId, QuotaError> {
        let entry_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO usage_entries (id, user_id, category, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .bind(category)
        .bind(self.clock.now())
        .execute(&self.pool)
        .await?;

        Ok(entry_id)
    }

    async fn count_since(
        &self,
        user_id: i32,
        category: FeatureCategory,
        boundary: DateTime<Utc>,
    ) -> Result<i64, QuotaError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM usage_entries
            WHERE user_id = $1 AND category = $2 AND created_at >= $3
            "#,
        )
        .bind(user_id)
        .bind(category)
        .bind(boundary)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Serializes callers for the same (user, category) with a
    /// transaction-scoped advisory lock, released on commit or rollback.
    /// Other users and categories are not blocked.
    async fn record_if_below(
        &self,
        user_id: i32,
        category: FeatureCategory,
        boundary: DateTime<Utc>,
        limit: i64,
    ) -> Result<ConditionalRecord, QuotaError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(user_id)
            .bind(category.code())
            .execute(&mut *tx)
            .await?;

        let result = self
            .record_if_below_inner(&mut tx, user_id, category, boundary, limit)
            .await;

        match result {
            Ok(outcome) => {
                tx.commit().await?;
                Ok(outcome)
            }
            Err(e) => {
                // The failed statement is what the caller needs to see
                if let Err(rollback_err) = tx.rollback().await {
                    log::warn!(
                        "Rollback after failed usage append for user {} ({}) also failed: {}",
                        user_id,
                        category,
                        rollback_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, QuotaError> {
        let result = sqlx::query("DELETE FROM usage_entries WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
