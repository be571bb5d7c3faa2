use async_trait::async_trait;
use chrono::{Duration, Utc};
use shopchat_core::errors::{Collaborator, CollaboratorError};
use shopchat_core::ports::ResponseCache;
use sqlx::Row;

use super::{format_timestamp, parse_timestamp, RepositoryError};
use crate::DbPool;

/// Ten years; longer TTLs are clamped.
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Response memo table with per-entry expiry. Writes are last-writer-wins upserts.
pub struct SqlResponseCache {
    pool: DbPool,
}

impl SqlResponseCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn read(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT value, expires_at FROM response_cache WHERE cache_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at = parse_timestamp("expires_at", row.try_get("expires_at")?)?;
        if expires_at <= Utc::now() {
            sqlx::query("DELETE FROM response_cache WHERE cache_key = ? AND expires_at <= ?")
                .bind(key)
                .bind(format_timestamp(&Utc::now()))
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }
        Ok(Some(row.try_get("value")?))
    }

    async fn write(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let ttl = Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64);
        sqlx::query(
            r#"
            INSERT INTO response_cache (cache_key, value, expires_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(cache_key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(format_timestamp(&(now + ttl)))
        .bind(format_timestamp(&now))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Drops every expired entry; returns how many rows were removed.
    pub async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM response_cache WHERE expires_at <= ?")
            .bind(format_timestamp(&Utc::now()))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ResponseCache for SqlResponseCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CollaboratorError> {
        self.read(key).await.map_err(|error| error.into_collaborator(Collaborator::Cache))
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CollaboratorError> {
        self.write(key, value, ttl_secs)
            .await
            .map_err(|error| error.into_collaborator(Collaborator::Cache))
    }
}

#[cfg(test)]
mod tests {
    use shopchat_core::ports::ResponseCache;

    use super::SqlResponseCache;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn set_then_get_and_last_write_wins() {
        let cache = SqlResponseCache::new(setup_pool().await);
        assert_eq!(cache.get("chat:v1:abc").await.expect("miss"), None);

        cache.set("chat:v1:abc", "trả lời 1", 60).await.expect("first write");
        cache.set("chat:v1:abc", "trả lời 2", 60).await.expect("second write");

        assert_eq!(cache.get("chat:v1:abc").await.expect("hit"), Some("trả lời 2".to_string()));
    }

    #[tokio::test]
    async fn expired_entries_read_as_miss_and_are_purged() {
        let pool = setup_pool().await;
        let cache = SqlResponseCache::new(pool.clone());
        cache.set("chat:v1:stale", "cũ", 0).await.expect("write");

        assert_eq!(cache.get("chat:v1:stale").await.expect("expired"), None);
        cache.set("chat:v1:stale-2", "cũ", 0).await.expect("write");
        assert_eq!(cache.purge_expired().await.expect("purge"), 1);
    }
}
