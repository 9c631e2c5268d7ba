//! Flight-level data model: cabin classes, payment modes, and the cash-fare
//! and award-availability records produced by the external collectors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Cabin class
// ---------------------------------------------------------------------------

/// Cabin of service. Mixed-cabin itineraries are not modelled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    /// All cabins, cheapest first.
    pub const ALL: [CabinClass; 4] = [
        CabinClass::Economy,
        CabinClass::PremiumEconomy,
        CabinClass::Business,
        CabinClass::First,
    ];

    /// The value stored in the `cabin_class` columns.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::PremiumEconomy => "premium_economy",
            Self::Business => "business",
            Self::First => "first",
        }
    }

    /// Parse from the database / request representation.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "economy" => Ok(Self::Economy),
            "premium_economy" => Ok(Self::PremiumEconomy),
            "business" => Ok(Self::Business),
            "first" => Ok(Self::First),
            other => Err(CoreError::Validation(format!(
                "Unknown cabin class '{other}'. Must be one of: economy, premium_economy, business, first"
            ))),
        }
    }
}

impl std::fmt::Display for CabinClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payment mode
// ---------------------------------------------------------------------------

/// Which legs of the aggregation a search wants: cash fares, award space, or both.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Points,
    #[default]
    Both,
}

impl PaymentMode {
    pub fn includes_cash(self) -> bool {
        matches!(self, Self::Cash | Self::Both)
    }

    pub fn includes_points(self) -> bool {
        matches!(self, Self::Points | Self::Both)
    }

    /// Parse from the request representation.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "cash" => Ok(Self::Cash),
            "points" => Ok(Self::Points),
            "both" => Ok(Self::Both),
            other => Err(CoreError::Validation(format!(
                "Unknown payment type '{other}'. Must be one of: cash, points, both"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Points => "points",
            Self::Both => "both",
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Flight identity used for duplicate suppression within one result subset.
pub type FlightKey<'a> = (&'a str, &'a str, CabinClass);

/// A collected cash fare.
///
/// Unique on `(origin, destination, departure_date, airline, flight_number,
/// cabin_class)`. Rows older than the cash freshness window are never selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFareRecord {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub airline: String,
    pub flight_number: String,
    pub cabin_class: CabinClass,
    pub price_usd: f64,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub stops: i32,
    pub booking_url: Option<String>,
    pub fetched_at: Timestamp,
}

impl CashFareRecord {
    pub fn flight_key(&self) -> FlightKey<'_> {
        (self.airline.as_str(), self.flight_number.as_str(), self.cabin_class)
    }
}

/// A collected award-availability row for one loyalty program.
///
/// Unique on the cash-fare key plus `program`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardRecord {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub airline: String,
    pub flight_number: String,
    pub cabin_class: CabinClass,
    pub program: String,
    pub miles_required: i64,
    pub taxes_fees: f64,
    pub seats_available: i32,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub stops: i32,
    pub scraped_at: Timestamp,
}

impl AwardRecord {
    pub fn flight_key(&self) -> FlightKey<'_> {
        (self.airline.as_str(), self.flight_number.as_str(), self.cabin_class)
    }
}
