//! Repository for the `search_usage` table.

use awardfare_core::types::DbId;
use sqlx::PgPool;

/// Monthly search counters, one row per identity and month.
pub struct SearchUsageRepo;

impl SearchUsageRepo {
    /// Searches recorded for `identity_key` in `month`; 0 if none.
    pub async fn get_count(
        pool: &PgPool,
        identity_key: &str,
        month: &str,
    ) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT search_count FROM search_usage WHERE identity_key = $1 AND month = $2",
        )
        .bind(identity_key)
        .bind(month)
        .fetch_optional(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// Atomically add one search, creating the row on first use.
    /// Returns the new count.
    pub async fn increment(
        pool: &PgPool,
        identity_key: &str,
        user_id: Option<DbId>,
        ip_address: Option<&str>,
        month: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO search_usage (identity_key, user_id, ip_address, month, search_count) \
             VALUES ($1, $2, $3, $4, 1) \
             ON CONFLICT (identity_key, month) \
             DO UPDATE SET search_count = search_usage.search_count + 1, updated_at = NOW() \
             RETURNING search_count",
        )
        .bind(identity_key)
        .bind(user_id)
        .bind(ip_address)
        .bind(month)
        .fetch_one(pool)
        .await
    }
}
