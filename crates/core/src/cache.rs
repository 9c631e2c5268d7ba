//! Result Cache: a short-TTL byte cache keyed by route, date and cabin.
//!
//! Two namespaces are used, one for cash fares and one for awards, each with
//! its own TTL. Population is last-writer-wins; a stale overwrite is bounded
//! by the TTL because payloads are derived purely from a repository read.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::flight::CabinClass;

/// Cash-fare entries live for 15 minutes.
pub const CASH_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Award entries live for 4 hours.
pub const AWARD_CACHE_TTL: Duration = Duration::from_secs(4 * 60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache call timed out after {0:?}")]
    Timeout(Duration),
}

/// Key/value byte cache with per-entry TTL.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), CacheError>;
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Cache namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    Fares,
    Awards,
}

impl CacheNamespace {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Fares => "fares",
            Self::Awards => "awards",
        }
    }

    pub fn ttl(self) -> Duration {
        match self {
            Self::Fares => CASH_CACHE_TTL,
            Self::Awards => AWARD_CACHE_TTL,
        }
    }
}

/// Build the key for one route/date/cabin, e.g. `fares:JFK:TYO:2026-11-02:business`.
///
/// Codes are the ones the caller searched with, before metro expansion.
pub fn cache_key(
    namespace: CacheNamespace,
    origin: &str,
    destination: &str,
    date: NaiveDate,
    cabin: CabinClass,
) -> String {
    format!(
        "{}:{origin}:{destination}:{}:{}",
        namespace.prefix(),
        date.format("%Y-%m-%d"),
        cabin.as_str()
    )
}

// ---------------------------------------------------------------------------
// In-process cache
// ---------------------------------------------------------------------------

/// Process-local cache used when no external cache is configured.
///
/// Expired entries read as absent and are dropped lazily on access or by
/// [`InMemoryCache::evict_expired`].
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, (Vec<u8>, Instant)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub async fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ResultCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, expires_at)) if *expires_at > now => return Ok(Some(value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: drop it unless a concurrent writer refreshed it meanwhile.
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|(_, expires_at)| *expires_at <= now)
        {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, expires_at));
        Ok(())
    }
}
