//! Repository for the `searches` table.

use sqlx::PgPool;

use crate::models::search::CreateSearchLog;

/// Append-only log of admitted searches.
pub struct SearchLogRepo;

impl SearchLogRepo {
    pub async fn create(pool: &PgPool, log: &CreateSearchLog) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO searches (search_id, user_id, ip_address, origin, destination, \
                                   departure_date, return_date, cabin_class, passengers, \
                                   payment_type, selected_programs) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(&log.search_id)
        .bind(log.user_id)
        .bind(&log.ip_address)
        .bind(&log.origin)
        .bind(&log.destination)
        .bind(log.departure_date)
        .bind(log.return_date)
        .bind(&log.cabin_class)
        .bind(log.passengers)
        .bind(&log.payment_type)
        .bind(&log.selected_programs)
        .execute(pool)
        .await?;
        Ok(())
    }
}
