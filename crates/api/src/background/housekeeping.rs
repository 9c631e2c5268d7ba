//! Periodic purge of expired flight data.
//!
//! Deletes award and cash rows older than [`PURGE_AGE_HOURS`] and, when the
//! in-process result cache is in use, drops its expired entries. Runs on a
//! fixed interval using `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use awardfare_core::cache::InMemoryCache;
use awardfare_core::repository::PURGE_AGE_HOURS;
use awardfare_db::repositories::{AwardRepo, CashFareRepo};
use awardfare_db::DbPool;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// Run the housekeeping loop until `cancel` is triggered.
pub async fn run(
    pool: DbPool,
    local_cache: Option<Arc<InMemoryCache>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        purge_age_hours = PURGE_AGE_HOURS,
        interval_secs = interval.as_secs(),
        "Housekeeping job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Housekeeping job stopping");
                break;
            }
            _ = ticker.tick() => {
                let cutoff = Utc::now() - chrono::Duration::hours(PURGE_AGE_HOURS);

                match AwardRepo::delete_older_than(&pool, cutoff).await {
                    Ok(0) => tracing::debug!("Housekeeping: no award rows to purge"),
                    Ok(deleted) => tracing::info!(deleted, "Housekeeping: purged old award rows"),
                    Err(e) => tracing::error!(error = %e, "Housekeeping: award purge failed"),
                }

                match CashFareRepo::delete_older_than(&pool, cutoff).await {
                    Ok(0) => tracing::debug!("Housekeeping: no cash fares to purge"),
                    Ok(deleted) => tracing::info!(deleted, "Housekeeping: purged old cash fares"),
                    Err(e) => tracing::error!(error = %e, "Housekeeping: cash purge failed"),
                }

                if let Some(cache) = &local_cache {
                    let evicted = cache.evict_expired().await;
                    if evicted > 0 {
                        tracing::debug!(evicted, "Housekeeping: evicted expired cache entries");
                    }
                }
            }
        }
    }
}
