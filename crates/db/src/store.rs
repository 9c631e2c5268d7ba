//! Postgres implementations of the core collaborator traits.

use async_trait::async_trait;
use awardfare_core::catalog::{InMemoryCatalog, PointsValuation, TransferPartner};
use awardfare_core::flight::{AwardRecord, CashFareRecord};
use awardfare_core::history::SearchHistory;
use awardfare_core::repository::{AwardRepository, FareRepository, FlightQuery, RepositoryError};
use awardfare_core::search::SearchRequest;
use awardfare_core::usage::{Identity, UsageStore};
use chrono::Utc;

use crate::models::search::CreateSearchLog;
use crate::repositories::{AwardRepo, CashFareRepo, ReferenceRepo, SearchLogRepo, SearchUsageRepo};
use crate::DbPool;

fn query_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

// ---------------------------------------------------------------------------
// Flight data
// ---------------------------------------------------------------------------

/// Fare and award repository over the collector tables.
#[derive(Clone)]
pub struct PgFlightStore {
    pool: DbPool,
}

impl PgFlightStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FareRepository for PgFlightStore {
    async fn query_cash_fares(
        &self,
        query: &FlightQuery,
        freshness: chrono::Duration,
    ) -> Result<Vec<CashFareRecord>, RepositoryError> {
        let rows = CashFareRepo::search(
            &self.pool,
            &query.origins,
            &query.destinations,
            query.date,
            query.cabin.as_str(),
            Utc::now() - freshness,
        )
        .await
        .map_err(query_error)?;

        rows.into_iter().map(CashFareRecord::try_from).collect()
    }
}

#[async_trait]
impl AwardRepository for PgFlightStore {
    async fn query_awards(
        &self,
        query: &FlightQuery,
        freshness: chrono::Duration,
    ) -> Result<Vec<AwardRecord>, RepositoryError> {
        let rows = AwardRepo::search(
            &self.pool,
            &query.origins,
            &query.destinations,
            query.date,
            query.cabin.as_str(),
            Utc::now() - freshness,
        )
        .await
        .map_err(query_error)?;

        rows.into_iter().map(AwardRecord::try_from).collect()
    }
}

// ---------------------------------------------------------------------------
// Usage counters
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgUsageStore {
    pool: DbPool,
}

impl PgUsageStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageStore for PgUsageStore {
    async fn search_count(&self, identity: &Identity, month: &str) -> Result<i64, RepositoryError> {
        SearchUsageRepo::get_count(&self.pool, &identity.key(), month)
            .await
            .map_err(query_error)
    }

    async fn increment(&self, identity: &Identity, month: &str) -> Result<i64, RepositoryError> {
        let ip_address = match identity {
            Identity::Ip(ip) => Some(ip.as_str()),
            Identity::User(_) => None,
        };
        SearchUsageRepo::increment(
            &self.pool,
            &identity.key(),
            identity.user_id(),
            ip_address,
            month,
        )
        .await
        .map_err(query_error)
    }
}

// ---------------------------------------------------------------------------
// Search history
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgSearchHistory {
    pool: DbPool,
}

impl PgSearchHistory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchHistory for PgSearchHistory {
    async fn record(
        &self,
        search_id: &str,
        identity: &Identity,
        request: &SearchRequest,
    ) -> Result<(), RepositoryError> {
        let log = CreateSearchLog::new(search_id, identity, request);
        SearchLogRepo::create(&self.pool, &log)
            .await
            .map_err(query_error)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Load the seeded transfer graph and valuations into memory.
pub async fn load_catalog(pool: &DbPool) -> Result<InMemoryCatalog, RepositoryError> {
    let partners: Vec<TransferPartner> = ReferenceRepo::list_transfer_partners(pool)
        .await
        .map_err(query_error)?
        .into_iter()
        .map(TransferPartner::from)
        .collect();

    let valuations = ReferenceRepo::list_valuations(pool)
        .await
        .map_err(query_error)?
        .into_iter()
        .map(PointsValuation::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        partners = partners.len(),
        valuations = valuations.len(),
        "Reference catalog loaded",
    );

    Ok(InMemoryCatalog::new(partners, valuations))
}
