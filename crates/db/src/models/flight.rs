//! Cash fare and award availability rows.

use awardfare_core::flight::{AwardRecord, CabinClass, CashFareRecord};
use awardfare_core::repository::RepositoryError;
use awardfare_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use sqlx::FromRow;

/// A row from the `cash_fares` table.
#[derive(Debug, Clone, FromRow)]
pub struct CashFareRow {
    pub id: DbId,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub airline: String,
    pub flight_number: String,
    pub cabin_class: String,
    pub price_usd: f64,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub stops: i32,
    pub booking_url: Option<String>,
    pub fetched_at: Timestamp,
}

impl TryFrom<CashFareRow> for CashFareRecord {
    type Error = RepositoryError;

    fn try_from(row: CashFareRow) -> Result<Self, Self::Error> {
        let cabin_class = parse_cabin("cash_fares", row.id, &row.cabin_class)?;
        Ok(CashFareRecord {
            origin: row.origin,
            destination: row.destination,
            departure_date: row.departure_date,
            airline: row.airline,
            flight_number: row.flight_number,
            cabin_class,
            price_usd: row.price_usd,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            duration_minutes: row.duration_minutes,
            stops: row.stops,
            booking_url: row.booking_url,
            fetched_at: row.fetched_at,
        })
    }
}

/// A row from the `award_availability` table.
#[derive(Debug, Clone, FromRow)]
pub struct AwardRow {
    pub id: DbId,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub airline: String,
    pub flight_number: String,
    pub program: String,
    pub cabin_class: String,
    pub miles_required: i64,
    pub taxes_fees: f64,
    pub seats_available: i32,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub stops: i32,
    pub scraped_at: Timestamp,
}

impl TryFrom<AwardRow> for AwardRecord {
    type Error = RepositoryError;

    fn try_from(row: AwardRow) -> Result<Self, Self::Error> {
        let cabin_class = parse_cabin("award_availability", row.id, &row.cabin_class)?;
        Ok(AwardRecord {
            origin: row.origin,
            destination: row.destination,
            departure_date: row.departure_date,
            airline: row.airline,
            flight_number: row.flight_number,
            cabin_class,
            program: row.program,
            miles_required: row.miles_required,
            taxes_fees: row.taxes_fees,
            seats_available: row.seats_available,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            duration_minutes: row.duration_minutes,
            stops: row.stops,
            scraped_at: row.scraped_at,
        })
    }
}

pub(crate) fn parse_cabin(
    table: &str,
    id: DbId,
    name: &str,
) -> Result<CabinClass, RepositoryError> {
    CabinClass::from_name(name).map_err(|_| {
        RepositoryError::InvalidRow(format!("{table} id {id}: unknown cabin '{name}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn fare_row(cabin: &str) -> CashFareRow {
        CashFareRow {
            id: 7,
            origin: "JFK".into(),
            destination: "HND".into(),
            departure_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            airline: "NH".into(),
            flight_number: "NH9".into(),
            cabin_class: cabin.into(),
            price_usd: 4250.0,
            departure_time: None,
            arrival_time: None,
            duration_minutes: Some(850),
            stops: 0,
            booking_url: None,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn cash_row_converts_cabin() {
        let record = CashFareRecord::try_from(fare_row("premium_economy")).unwrap();
        assert_eq!(record.cabin_class, CabinClass::PremiumEconomy);
        assert_eq!(record.flight_number, "NH9");
    }

    #[test]
    fn unknown_cabin_is_an_invalid_row() {
        assert_matches!(
            CashFareRecord::try_from(fare_row("suite")),
            Err(RepositoryError::InvalidRow(msg)) if msg.contains("cash_fares id 7")
        );
    }

    #[test]
    fn award_row_converts() {
        let row = AwardRow {
            id: 3,
            origin: "EWR".into(),
            destination: "NRT".into(),
            departure_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            airline: "UA".into(),
            flight_number: "UA79".into(),
            program: "united_mileageplus".into(),
            cabin_class: "business".into(),
            miles_required: 70_000,
            taxes_fees: 5.6,
            seats_available: 2,
            departure_time: Some("10:30".into()),
            arrival_time: Some("13:55".into()),
            duration_minutes: None,
            stops: 0,
            scraped_at: Utc::now(),
        };
        let record = AwardRecord::try_from(row).unwrap();
        assert_eq!(record.cabin_class, CabinClass::Business);
        assert_eq!(record.miles_required, 70_000);
        assert_eq!(record.program, "united_mileageplus");
    }
}
