//! Redis-backed [`ResultCache`].
//!
//! Entries are stored as plain string keys with `SET ... EX`, so expiry is
//! handled by Redis and a key shared between service instances is
//! last-writer-wins.

use std::time::Duration;

use async_trait::async_trait;
use awardfare_core::cache::{CacheError, ResultCache};
use redis::{aio::ConnectionManager, AsyncCommands, Client};

/// Result cache over a multiplexed, auto-reconnecting Redis connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to `url` (e.g. `redis://localhost:6379`).
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!("Connected to Redis for result cache");
        Ok(Self { conn })
    }
}

fn backend_error(e: redis::RedisError) -> CacheError {
    CacheError::Backend(e.to_string())
}

/// Redis expiries are whole seconds; never round a TTL down to zero.
fn expiry_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl ResultCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(backend_error)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, expiry_secs(ttl))
            .await
            .map_err(backend_error)?;
        tracing::debug!(cache_key = key, ttl_secs = expiry_secs(ttl), "Cached result");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_whole_seconds_and_at_least_one() {
        assert_eq!(expiry_secs(Duration::from_secs(900)), 900);
        assert_eq!(expiry_secs(Duration::from_millis(1500)), 1);
        assert_eq!(expiry_secs(Duration::from_millis(10)), 1);
    }
}
