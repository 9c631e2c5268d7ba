//! Fixtures and in-memory collaborators for tests.
//!
//! Enabled for this crate's unit tests and, through the `testkit` feature,
//! for the integration tests of dependent crates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Barrier;

use crate::cache::{CacheError, InMemoryCache, ResultCache};
use crate::flight::{AwardRecord, CabinClass, CashFareRecord};
use crate::history::SearchHistory;
use crate::ranking::{AwardResult, CashResult, RankedResult};
use crate::repository::{AwardRepository, FareRepository, FlightQuery, RepositoryError};
use crate::search::SearchRequest;
use crate::usage::{Identity, UsageStore};
use crate::valuation::AwardValue;

// ---------------------------------------------------------------------------
// Record fixtures
// ---------------------------------------------------------------------------

/// Departure date used by the fixtures: 2026-11-02.
pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 2).expect("valid fixture date")
}

/// A fresh cash fare on the given route.
pub fn cash_on(
    origin: &str,
    destination: &str,
    airline: &str,
    flight: &str,
    cabin: CabinClass,
    price_usd: f64,
) -> CashFareRecord {
    CashFareRecord {
        origin: origin.into(),
        destination: destination.into(),
        departure_date: date(),
        airline: airline.into(),
        flight_number: flight.into(),
        cabin_class: cabin,
        price_usd,
        departure_time: Some("11:00".into()),
        arrival_time: Some("14:25".into()),
        duration_minutes: Some(865),
        stops: 0,
        booking_url: None,
        fetched_at: Utc::now(),
    }
}

/// A fresh award row on the given route.
pub fn award_on(
    origin: &str,
    destination: &str,
    airline: &str,
    flight: &str,
    program: &str,
    cabin: CabinClass,
    miles: i64,
) -> AwardRecord {
    AwardRecord {
        origin: origin.into(),
        destination: destination.into(),
        departure_date: date(),
        airline: airline.into(),
        flight_number: flight.into(),
        cabin_class: cabin,
        program: program.into(),
        miles_required: miles,
        taxes_fees: 5.6,
        seats_available: 2,
        departure_time: Some("11:00".into()),
        arrival_time: Some("14:25".into()),
        duration_minutes: Some(865),
        stops: 0,
        scraped_at: Utc::now(),
    }
}

/// A fresh JFK-NRT award row.
pub fn award(
    airline: &str,
    flight: &str,
    program: &str,
    cabin: CabinClass,
    miles: i64,
) -> AwardRecord {
    award_on("JFK", "NRT", airline, flight, program, cabin, miles)
}

/// A ranked cash entry whose flight number is `flight`.
pub fn cash_result(flight: &str, price_usd: f64) -> RankedResult {
    RankedResult::Cash(CashResult::from(cash_on(
        "JFK",
        "NRT",
        "XX",
        flight,
        CabinClass::Business,
        price_usd,
    )))
}

/// A ranked award entry valued at `cents_per_point`, with no transfer path.
pub fn award_result(flight: &str, cents_per_point: f64) -> RankedResult {
    let record = award("XX", flight, "test_program", CabinClass::Business, 100_000);
    let value = AwardValue {
        cents_per_point,
        estimated_cash_value: (100_000.0 * cents_per_point / 100.0).round() as i64,
    };
    RankedResult::Award(AwardResult::new(record, value, None))
}

// ---------------------------------------------------------------------------
// Flight store
// ---------------------------------------------------------------------------

/// Fare and award repository over in-memory rows, with failure and latency
/// injection and per-source query counters.
#[derive(Default)]
pub struct MemoryFlightStore {
    fares: Mutex<Vec<CashFareRecord>>,
    awards: Mutex<Vec<AwardRecord>>,
    fail_fares: AtomicBool,
    fail_awards: AtomicBool,
    delay: Mutex<Option<Duration>>,
    fare_queries: AtomicUsize,
    award_queries: AtomicUsize,
}

impl MemoryFlightStore {
    pub fn add_fare(&self, fare: CashFareRecord) {
        self.fares.lock().unwrap().push(fare);
    }

    pub fn add_award(&self, award: AwardRecord) {
        self.awards.lock().unwrap().push(award);
    }

    pub fn fail_fares(&self, fail: bool) {
        self.fail_fares.store(fail, Ordering::SeqCst);
    }

    pub fn fail_awards(&self, fail: bool) {
        self.fail_awards.store(fail, Ordering::SeqCst);
    }

    /// Delay every query by `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn fare_queries(&self) -> usize {
        self.fare_queries.load(Ordering::SeqCst)
    }

    pub fn award_queries(&self) -> usize {
        self.award_queries.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn matches(
    query: &FlightQuery,
    origin: &str,
    destination: &str,
    date: NaiveDate,
    cabin: CabinClass,
) -> bool {
    query.origins.iter().any(|o| o == origin)
        && query.destinations.iter().any(|d| d == destination)
        && query.date == date
        && query.cabin == cabin
}

#[async_trait]
impl FareRepository for MemoryFlightStore {
    async fn query_cash_fares(
        &self,
        query: &FlightQuery,
        freshness: chrono::Duration,
    ) -> Result<Vec<CashFareRecord>, RepositoryError> {
        self.fare_queries.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_fares.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("cash_fares unavailable".into()));
        }

        let cutoff = Utc::now() - freshness;
        let mut rows: Vec<CashFareRecord> = self
            .fares
            .lock()
            .unwrap()
            .iter()
            .filter(|f| {
                matches(query, &f.origin, &f.destination, f.departure_date, f.cabin_class)
                    && f.fetched_at >= cutoff
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.price_usd.total_cmp(&b.price_usd));
        Ok(rows)
    }
}

#[async_trait]
impl AwardRepository for MemoryFlightStore {
    async fn query_awards(
        &self,
        query: &FlightQuery,
        freshness: chrono::Duration,
    ) -> Result<Vec<AwardRecord>, RepositoryError> {
        self.award_queries.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_awards.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("award_availability unavailable".into()));
        }

        let cutoff = Utc::now() - freshness;
        let mut rows: Vec<AwardRecord> = self
            .awards
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                matches(query, &a.origin, &a.destination, a.departure_date, a.cabin_class)
                    && a.scraped_at >= cutoff
            })
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.miles_required);
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// [`InMemoryCache`] wrapper that can fail or stall on demand and records
/// every call.
#[derive(Default)]
pub struct ScriptedCache {
    inner: InMemoryCache,
    failing_reads: AtomicUsize,
    fail_writes: AtomicBool,
    read_delay: Mutex<Option<Duration>>,
    reads: AtomicUsize,
    written: Mutex<Vec<(String, Duration)>>,
}

impl ScriptedCache {
    pub fn inner(&self) -> &InMemoryCache {
        &self.inner
    }

    /// Fail the next `n` reads.
    pub fn fail_next_reads(&self, n: usize) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.written.lock().unwrap().len()
    }

    /// `(key, ttl)` of every successful write.
    pub fn written_ttls(&self) -> Vec<(String, Duration)> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultCache for ScriptedCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failing = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(CacheError::Backend("scripted read failure".into()));
        }
        self.inner.get(key).await
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("scripted write failure".into()));
        }
        self.inner.set_with_ttl(key, value, ttl).await?;
        self.written.lock().unwrap().push((key.to_string(), ttl));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Usage store
// ---------------------------------------------------------------------------

/// Usage counters in a map keyed by `(identity key, month)`.
#[derive(Default)]
pub struct MemoryUsageStore {
    counts: tokio::sync::Mutex<HashMap<(String, String), i64>>,
    fail_reads: AtomicBool,
    increment_barrier: Mutex<Option<Arc<Barrier>>>,
}

impl MemoryUsageStore {
    pub async fn set_count(&self, identity: &Identity, month: &str, count: i64) {
        self.counts
            .lock()
            .await
            .insert((identity.key(), month.to_string()), count);
    }

    pub async fn count(&self, identity: &Identity, month: &str) -> i64 {
        self.counts
            .lock()
            .await
            .get(&(identity.key(), month.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make increments wait until `n` of them are in flight.
    pub fn hold_increments(&self, n: usize) {
        *self.increment_barrier.lock().unwrap() = Some(Arc::new(Barrier::new(n)));
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn search_count(&self, identity: &Identity, month: &str) -> Result<i64, RepositoryError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("search_usage unavailable".into()));
        }
        Ok(self.count(identity, month).await)
    }

    async fn increment(&self, identity: &Identity, month: &str) -> Result<i64, RepositoryError> {
        let barrier = self.increment_barrier.lock().unwrap().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        let mut counts = self.counts.lock().await;
        let count = counts
            .entry((identity.key(), month.to_string()))
            .or_insert(0);
        *count += 1;
        Ok(*count)
    }
}

// ---------------------------------------------------------------------------
// Search history
// ---------------------------------------------------------------------------

/// One recorded search.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub search_id: String,
    pub identity: Identity,
    pub request: SearchRequest,
}

/// History sink that keeps entries in memory.
#[derive(Default)]
pub struct MemorySearchHistory {
    entries: Mutex<Vec<HistoryEntry>>,
    fail: AtomicBool,
}

impl MemorySearchHistory {
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SearchHistory for MemorySearchHistory {
    async fn record(
        &self,
        search_id: &str,
        identity: &Identity,
        request: &SearchRequest,
    ) -> Result<(), RepositoryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("searches unavailable".into()));
        }
        self.entries.lock().unwrap().push(HistoryEntry {
            search_id: search_id.to_string(),
            identity: identity.clone(),
            request: request.clone(),
        });
        Ok(())
    }
}
