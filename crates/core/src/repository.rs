//! Read-side contracts for the fare and award stores.
//!
//! Records are written by external collectors; the engine only queries them,
//! restricted to a freshness window measured back from the time of the call.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::flight::{AwardRecord, CabinClass, CashFareRecord};

/// Cash fares older than this many minutes are not selected.
pub const CASH_FRESHNESS_MINUTES: i64 = 15;

/// Award rows older than this many hours are not selected.
pub const AWARD_FRESHNESS_HOURS: i64 = 4;

/// Award and cash rows older than this many hours are deleted by housekeeping.
pub const PURGE_AGE_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository query failed: {0}")]
    Query(String),

    #[error("repository returned an invalid row: {0}")]
    InvalidRow(String),
}

/// Filter for one leg lookup. Airport sets are already metro-expanded; a row
/// matches if its origin is in `origins` AND its destination is in
/// `destinations`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightQuery {
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    pub date: NaiveDate,
    pub cabin: CabinClass,
}

#[async_trait]
pub trait FareRepository: Send + Sync {
    /// Fresh cash fares matching `query`, cheapest first.
    async fn query_cash_fares(
        &self,
        query: &FlightQuery,
        freshness: chrono::Duration,
    ) -> Result<Vec<CashFareRecord>, RepositoryError>;
}

#[async_trait]
pub trait AwardRepository: Send + Sync {
    /// Fresh award rows matching `query`, fewest miles first.
    async fn query_awards(
        &self,
        query: &FlightQuery,
        freshness: chrono::Duration,
    ) -> Result<Vec<AwardRecord>, RepositoryError>;
}
