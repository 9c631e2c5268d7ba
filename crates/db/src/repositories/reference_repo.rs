//! Repository for the `transfer_partners` and `points_valuations` tables.

use sqlx::PgPool;

use crate::models::reference::{PointsValuationRow, TransferPartnerRow};

/// Read-only access to the seeded reference catalog.
pub struct ReferenceRepo;

impl ReferenceRepo {
    /// All transfer edges, grouped by source program in seed order.
    pub async fn list_transfer_partners(
        pool: &PgPool,
    ) -> Result<Vec<TransferPartnerRow>, sqlx::Error> {
        sqlx::query_as::<_, TransferPartnerRow>(
            "SELECT id, source_program, destination_program, transfer_ratio, transfer_time_hours \
             FROM transfer_partners \
             ORDER BY source_program, id",
        )
        .fetch_all(pool)
        .await
    }

    /// All per-cabin valuations.
    pub async fn list_valuations(pool: &PgPool) -> Result<Vec<PointsValuationRow>, sqlx::Error> {
        sqlx::query_as::<_, PointsValuationRow>(
            "SELECT id, program, cabin_class, cents_per_point \
             FROM points_valuations \
             ORDER BY program, id",
        )
        .fetch_all(pool)
        .await
    }
}
