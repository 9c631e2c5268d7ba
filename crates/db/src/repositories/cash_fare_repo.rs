//! Repository for the `cash_fares` table.

use awardfare_core::types::Timestamp;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::flight::CashFareRow;

/// Column list for `cash_fares` queries.
const COLUMNS: &str = "\
    id, origin, destination, departure_date, airline, flight_number, \
    cabin_class, price_usd, departure_time, arrival_time, duration_minutes, \
    stops, booking_url, fetched_at";

/// Read and purge operations for collected cash fares.
pub struct CashFareRepo;

impl CashFareRepo {
    /// Fares on any `origins` x `destinations` pair fetched after
    /// `fetched_after`, cheapest first.
    pub async fn search(
        pool: &PgPool,
        origins: &[String],
        destinations: &[String],
        departure_date: NaiveDate,
        cabin_class: &str,
        fetched_after: Timestamp,
    ) -> Result<Vec<CashFareRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cash_fares \
             WHERE origin = ANY($1) \
               AND destination = ANY($2) \
               AND departure_date = $3 \
               AND cabin_class = $4 \
               AND fetched_at > $5 \
             ORDER BY price_usd ASC"
        );
        sqlx::query_as::<_, CashFareRow>(&query)
            .bind(origins)
            .bind(destinations)
            .bind(departure_date)
            .bind(cabin_class)
            .bind(fetched_after)
            .fetch_all(pool)
            .await
    }

    /// Delete fares fetched before `cutoff`. Returns the number of rows deleted.
    pub async fn delete_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cash_fares WHERE fetched_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
