//! Repository for the `award_availability` table.

use awardfare_core::types::Timestamp;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::flight::AwardRow;

/// Column list for `award_availability` queries.
const COLUMNS: &str = "\
    id, origin, destination, departure_date, airline, flight_number, program, \
    cabin_class, miles_required, taxes_fees, seats_available, departure_time, \
    arrival_time, duration_minutes, stops, scraped_at";

/// Read and purge operations for collected award availability.
pub struct AwardRepo;

impl AwardRepo {
    /// Award rows on any `origins` x `destinations` pair scraped after
    /// `scraped_after`, fewest miles first.
    pub async fn search(
        pool: &PgPool,
        origins: &[String],
        destinations: &[String],
        departure_date: NaiveDate,
        cabin_class: &str,
        scraped_after: Timestamp,
    ) -> Result<Vec<AwardRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM award_availability \
             WHERE origin = ANY($1) \
               AND destination = ANY($2) \
               AND departure_date = $3 \
               AND cabin_class = $4 \
               AND scraped_at > $5 \
             ORDER BY miles_required ASC"
        );
        sqlx::query_as::<_, AwardRow>(&query)
            .bind(origins)
            .bind(destinations)
            .bind(departure_date)
            .bind(cabin_class)
            .bind(scraped_after)
            .fetch_all(pool)
            .await
    }

    /// Delete rows scraped before `cutoff`. Returns the number of rows deleted.
    pub async fn delete_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM award_availability WHERE scraped_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
