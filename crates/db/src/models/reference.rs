//! Transfer partner and points valuation rows.

use awardfare_core::catalog::{PointsValuation, TransferPartner};
use awardfare_core::repository::RepositoryError;
use awardfare_core::types::DbId;
use sqlx::FromRow;

use super::flight::parse_cabin;

/// A row from the `transfer_partners` table.
#[derive(Debug, Clone, FromRow)]
pub struct TransferPartnerRow {
    pub id: DbId,
    pub source_program: String,
    pub destination_program: String,
    pub transfer_ratio: f64,
    pub transfer_time_hours: i32,
}

impl From<TransferPartnerRow> for TransferPartner {
    fn from(row: TransferPartnerRow) -> Self {
        TransferPartner {
            source_program: row.source_program,
            destination_program: row.destination_program,
            transfer_ratio: row.transfer_ratio,
            transfer_time_hours: row.transfer_time_hours,
        }
    }
}

/// A row from the `points_valuations` table.
#[derive(Debug, Clone, FromRow)]
pub struct PointsValuationRow {
    pub id: DbId,
    pub program: String,
    pub cabin_class: String,
    pub cents_per_point: f64,
}

impl TryFrom<PointsValuationRow> for PointsValuation {
    type Error = RepositoryError;

    fn try_from(row: PointsValuationRow) -> Result<Self, Self::Error> {
        Ok(PointsValuation {
            cabin_class: parse_cabin("points_valuations", row.id, &row.cabin_class)?,
            program: row.program,
            cents_per_point: row.cents_per_point,
        })
    }
}
