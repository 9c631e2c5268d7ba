//! Aggregation Engine.
//!
//! For each leg of a search: cache lookup, repository fallback and cache
//! population for the cash and award sources (run concurrently), then
//! program-access filtering, valuation, duplicate suppression and ranking.
//!
//! Failure policy:
//! - a cache read that errors or times out is retried once, then the
//!   repository is read instead
//! - a repository failure or timeout is never retried; it drops that source
//!   from the leg and is reported in `unavailable`
//! - only when every requested source of every leg failed does the search
//!   itself fail with `UpstreamUnavailable`
//!
//! Dropping a search future cancels its in-flight calls. Cache population is
//! idempotent, so nothing needs rolling back.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{cache_key, CacheNamespace, ResultCache};
use crate::catalog::ReferenceCatalog;
use crate::error::CoreError;
use crate::flight::{AwardRecord, CabinClass, CashFareRecord, PaymentMode};
use crate::metro;
use crate::ranking::{rank, AwardResult, CashResult, RankedResult};
use crate::repository::{
    AwardRepository, FareRepository, FlightQuery, RepositoryError, AWARD_FRESHNESS_HOURS,
    CASH_FRESHNESS_MINUTES,
};
use crate::search::{SearchRequest, SearchResponse};
use crate::valuation::{best_transfer_for, reachable_programs, value_of};

/// Default per-call cache timeout.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

/// Default per-call repository timeout.
pub const DEFAULT_REPOSITORY_TIMEOUT: Duration = Duration::from_secs(5);

/// Cache reads are attempted this many times before falling back.
const CACHE_READ_ATTEMPTS: usize = 2;

/// Timeouts applied to each collaborator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub cache_timeout: Duration,
    pub repository_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
            repository_timeout: DEFAULT_REPOSITORY_TIMEOUT,
        }
    }
}

// ---------------------------------------------------------------------------
// Legs
// ---------------------------------------------------------------------------

/// Direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Outbound,
    Return,
}

impl Leg {
    pub fn as_str(self) -> &'static str {
        match self {
            Leg::Outbound => "outbound",
            Leg::Return => "return",
        }
    }
}

/// One of the two independent lookups in a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegSource {
    Cash,
    Award,
}

impl LegSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LegSource::Cash => "cash",
            LegSource::Award => "award",
        }
    }

    fn namespace(self) -> CacheNamespace {
        match self {
            LegSource::Cash => CacheNamespace::Fares,
            LegSource::Award => CacheNamespace::Awards,
        }
    }

    fn repository(self) -> &'static str {
        match self {
            LegSource::Cash => "fare_repository",
            LegSource::Award => "award_repository",
        }
    }
}

/// Ranked results for one leg, plus the sources that could not be read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegResults {
    pub results: Vec<RankedResult>,
    pub unavailable: Vec<LegSource>,
}

/// Parameters of one leg lookup. Codes are as searched, before metro expansion.
#[derive(Debug, Clone, Copy)]
pub struct LegQuery<'a> {
    pub origin: &'a str,
    pub destination: &'a str,
    pub date: NaiveDate,
    pub cabin: CabinClass,
    pub payment_mode: PaymentMode,
    pub held_programs: &'a [String],
}

impl LegQuery<'_> {
    fn requested_sources(&self) -> usize {
        usize::from(self.payment_mode.includes_cash())
            + usize::from(self.payment_mode.includes_points())
    }

    fn flight_query(&self) -> FlightQuery {
        FlightQuery {
            origins: metro::expand(self.origin),
            destinations: metro::expand(self.destination),
            date: self.date,
            cabin: self.cabin,
        }
    }

    fn cache_key(&self, source: LegSource) -> String {
        cache_key(
            source.namespace(),
            self.origin,
            self.destination,
            self.date,
            self.cabin,
        )
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Stateless between calls; share one instance across requests.
pub struct AggregationEngine {
    fares: Arc<dyn FareRepository>,
    awards: Arc<dyn AwardRepository>,
    cache: Arc<dyn ResultCache>,
    catalog: Arc<dyn ReferenceCatalog>,
    config: EngineConfig,
}

impl AggregationEngine {
    pub fn new(
        fares: Arc<dyn FareRepository>,
        awards: Arc<dyn AwardRepository>,
        cache: Arc<dyn ResultCache>,
        catalog: Arc<dyn ReferenceCatalog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            fares,
            awards,
            cache,
            catalog,
            config,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn ReferenceCatalog> {
        &self.catalog
    }

    /// Run a full search: the outbound leg and, when a return date is given,
    /// the return leg with origin and destination swapped.
    pub async fn perform_search(
        &self,
        request: &SearchRequest,
        search_id: String,
    ) -> Result<SearchResponse, CoreError> {
        let outbound_query = LegQuery {
            origin: &request.origin,
            destination: &request.destination,
            date: request.departure_date,
            cabin: request.cabin_class,
            payment_mode: request.payment_mode,
            held_programs: &request.held_programs,
        };
        let return_query = request.return_date.map(|date| LegQuery {
            origin: &request.destination,
            destination: &request.origin,
            date,
            ..outbound_query
        });

        let (outbound, inbound) = tokio::join!(self.run_leg(&outbound_query), async {
            match &return_query {
                Some(query) => Some(self.run_leg(query).await),
                None => None,
            }
        });

        let mut requested = outbound_query.requested_sources();
        let mut unavailable: Vec<String> = outbound
            .unavailable
            .iter()
            .map(|s| format!("{}.{}", Leg::Outbound.as_str(), s.as_str()))
            .collect();

        let return_results = match inbound {
            Some(leg) => {
                requested += outbound_query.requested_sources();
                unavailable.extend(
                    leg.unavailable
                        .iter()
                        .map(|s| format!("{}.{}", Leg::Return.as_str(), s.as_str())),
                );
                leg.results
            }
            None => Vec::new(),
        };

        if requested > 0 && unavailable.len() == requested {
            return Err(CoreError::UpstreamUnavailable {
                dependency: "flight_data",
                message: format!("no source could be read ({})", unavailable.join(", ")),
            });
        }

        tracing::debug!(
            search_id = %search_id,
            origin = %request.origin,
            outbound = outbound.results.len(),
            inbound = return_results.len(),
            unavailable = ?unavailable,
            "Search aggregated",
        );

        Ok(SearchResponse {
            search_id,
            origin: request.origin.clone(),
            destination: request.destination.clone(),
            departure_date: request.departure_date,
            return_date: request.return_date,
            cabin_class: request.cabin_class,
            passengers: request.passengers,
            outbound: outbound.results,
            return_results,
            unavailable,
        })
    }

    /// Rank one leg. Fails only if every requested source failed.
    pub async fn search(&self, query: &LegQuery<'_>) -> Result<LegResults, CoreError> {
        let leg = self.run_leg(query).await;
        let requested = query.requested_sources();
        if requested > 0 && leg.unavailable.len() == requested {
            return Err(CoreError::UpstreamUnavailable {
                dependency: "flight_data",
                message: format!(
                    "{} {} -> {} on {}: no source could be read",
                    query.cabin, query.origin, query.destination, query.date
                ),
            });
        }
        Ok(leg)
    }

    async fn run_leg(&self, query: &LegQuery<'_>) -> LegResults {
        let (cash, awards) = tokio::join!(
            async {
                if query.payment_mode.includes_cash() {
                    Some(self.cash_results(query).await)
                } else {
                    None
                }
            },
            async {
                if query.payment_mode.includes_points() {
                    Some(self.award_results(query).await)
                } else {
                    None
                }
            },
        );

        let mut merged = Vec::new();
        let mut unavailable = Vec::new();

        for (source, outcome) in [(LegSource::Cash, cash), (LegSource::Award, awards)] {
            match outcome {
                Some(Ok(results)) => merged.extend(results),
                Some(Err(e)) => {
                    tracing::warn!(
                        source = source.as_str(),
                        origin = query.origin,
                        destination = query.destination,
                        date = %query.date,
                        error = %e,
                        "Leg source unavailable, returning partial results",
                    );
                    unavailable.push(source);
                }
                None => {}
            }
        }

        LegResults {
            results: rank(merged),
            unavailable,
        }
    }

    // -----------------------------------------------------------------------
    // Sources
    // -----------------------------------------------------------------------

    async fn cash_results(&self, query: &LegQuery<'_>) -> Result<Vec<RankedResult>, CoreError> {
        let flight_query = query.flight_query();
        let freshness = chrono::Duration::minutes(CASH_FRESHNESS_MINUTES);
        let mut fares: Vec<CashFareRecord> = self
            .cached_or_fetch(
                LegSource::Cash,
                &query.cache_key(LegSource::Cash),
                self.fares.query_cash_fares(&flight_query, freshness),
            )
            .await?;

        fares.retain(|fare| {
            let valid = fare.price_usd > 0.0;
            if !valid {
                tracing::warn!(
                    airline = %fare.airline,
                    flight = %fare.flight_number,
                    price = fare.price_usd,
                    "Dropping cash fare with non-positive price",
                );
            }
            valid
        });
        fares.sort_by(|a, b| a.price_usd.total_cmp(&b.price_usd));

        let mut seen = HashSet::new();
        Ok(fares
            .into_iter()
            .filter(|fare| seen.insert(owned_key(fare.flight_key())))
            .map(|fare| RankedResult::Cash(CashResult::from(fare)))
            .collect())
    }

    async fn award_results(&self, query: &LegQuery<'_>) -> Result<Vec<RankedResult>, CoreError> {
        let flight_query = query.flight_query();
        let freshness = chrono::Duration::hours(AWARD_FRESHNESS_HOURS);
        let mut awards: Vec<AwardRecord> = self
            .cached_or_fetch(
                LegSource::Award,
                &query.cache_key(LegSource::Award),
                self.awards.query_awards(&flight_query, freshness),
            )
            .await?;
        awards.sort_by_key(|a| a.miles_required);

        let catalog = self.catalog.as_ref();
        let reachable = reachable_programs(catalog, query.held_programs);
        let mut seen = HashSet::new();

        Ok(awards
            .into_iter()
            .filter(|a| reachable.as_ref().map_or(true, |set| set.contains(&a.program)))
            .filter(|a| seen.insert(owned_key(a.flight_key())))
            .map(|a| {
                let value = value_of(catalog, &a);
                let transfer = best_transfer_for(catalog, &a.program, query.held_programs);
                RankedResult::Award(AwardResult::new(a, value, transfer))
            })
            .collect())
    }

    // -----------------------------------------------------------------------
    // Cache-aside
    // -----------------------------------------------------------------------

    /// Serve `key` from the cache, else run `fetch` and cache a non-empty result.
    ///
    /// Empty results are never cached, so a cold route is re-queried on the
    /// next request rather than negatively cached.
    async fn cached_or_fetch<T, F>(
        &self,
        source: LegSource,
        key: &str,
        fetch: F,
    ) -> Result<Vec<T>, CoreError>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<Vec<T>, RepositoryError>>,
    {
        if let Some(bytes) = self.read_cache(key).await {
            match serde_json::from_slice::<Vec<T>>(&bytes) {
                Ok(records) => {
                    tracing::debug!(cache_key = key, rows = records.len(), "Cache hit");
                    return Ok(records);
                }
                Err(e) => {
                    tracing::warn!(cache_key = key, error = %e, "Undecodable cache entry, treating as miss");
                }
            }
        }

        let records = match tokio::time::timeout(self.config.repository_timeout, fetch).await {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                return Err(CoreError::UpstreamUnavailable {
                    dependency: source.repository(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(CoreError::UpstreamUnavailable {
                    dependency: source.repository(),
                    message: format!("timed out after {:?}", self.config.repository_timeout),
                })
            }
        };
        tracing::debug!(cache_key = key, rows = records.len(), "Cache miss, read repository");

        if !records.is_empty() {
            self.write_cache(key, &records, source.namespace().ttl()).await;
        }

        Ok(records)
    }

    async fn read_cache(&self, key: &str) -> Option<Vec<u8>> {
        for attempt in 1..=CACHE_READ_ATTEMPTS {
            match tokio::time::timeout(self.config.cache_timeout, self.cache.get(key)).await {
                Ok(Ok(hit)) => return hit,
                Ok(Err(e)) => {
                    tracing::warn!(cache_key = key, attempt, error = %e, "Cache read failed");
                }
                Err(_) => {
                    tracing::warn!(
                        cache_key = key,
                        attempt,
                        timeout_ms = self.config.cache_timeout.as_millis() as u64,
                        "Cache read timed out",
                    );
                }
            }
        }
        None
    }

    async fn write_cache<T: Serialize>(&self, key: &str, records: &[T], ttl: Duration) {
        let bytes = match serde_json::to_vec(records) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(cache_key = key, error = %e, "Failed to encode cache entry");
                return;
            }
        };

        match tokio::time::timeout(
            self.config.cache_timeout,
            self.cache.set_with_ttl(key, bytes, ttl),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(cache_key = key, error = %e, "Cache write failed"),
            Err(_) => tracing::warn!(cache_key = key, "Cache write timed out"),
        }
    }
}

fn owned_key((airline, flight, cabin): (&str, &str, CabinClass)) -> (String, String, CabinClass) {
    (airline.to_string(), flight.to_string(), cabin)
}
