//! Ranked result types and the cross-type ordering heuristic.
//!
//! Cash and award results are compared in three explicit cases:
//!
//! 1. award vs award: higher cents-per-point first
//! 2. cash vs cash: lower price first
//! 3. award vs cash: an award at or above [`HIGH_VALUE_CENTS_PER_POINT`]
//!    precedes the cash entry; any other pairing is equal rank
//!
//! Case 3 is a threshold rule, not a merge of dissimilar units.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::flight::{AwardRecord, CabinClass, CashFareRecord};
use crate::valuation::{AwardValue, TransferDescriptor};

/// Awards valued at or above this many cents per point outrank all cash fares.
pub const HIGH_VALUE_CENTS_PER_POINT: f64 = 2.0;

/// All cash prices are quoted in US dollars.
pub const CURRENCY_USD: &str = "USD";

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Cash price block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

/// Award cost block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardCost {
    pub miles_required: i64,
    pub taxes_and_fees: f64,
    pub seats_available: i32,
}

/// A cash fare as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashResult {
    pub airline: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub stops: i32,
    pub cabin_class: CabinClass,
    pub price: Price,
    pub booking_url: Option<String>,
}

impl From<CashFareRecord> for CashResult {
    fn from(fare: CashFareRecord) -> Self {
        Self {
            airline: fare.airline,
            flight_number: fare.flight_number,
            origin: fare.origin,
            destination: fare.destination,
            departure_time: fare.departure_time,
            arrival_time: fare.arrival_time,
            duration_minutes: fare.duration_minutes,
            stops: fare.stops,
            cabin_class: fare.cabin_class,
            price: Price {
                amount: fare.price_usd,
                currency: CURRENCY_USD.to_string(),
            },
            booking_url: fare.booking_url,
        }
    }
}

/// An award redemption as returned to clients, with its computed value and
/// the suggested transfer path (if any held program reaches it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardResult {
    pub airline: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub stops: i32,
    pub cabin_class: CabinClass,
    pub program: String,
    pub award: AwardCost,
    pub value: AwardValue,
    pub transfer: Option<TransferDescriptor>,
}

impl AwardResult {
    pub fn new(
        record: AwardRecord,
        value: AwardValue,
        transfer: Option<TransferDescriptor>,
    ) -> Self {
        Self {
            airline: record.airline,
            flight_number: record.flight_number,
            origin: record.origin,
            destination: record.destination,
            departure_time: record.departure_time,
            arrival_time: record.arrival_time,
            duration_minutes: record.duration_minutes,
            stops: record.stops,
            cabin_class: record.cabin_class,
            program: record.program,
            award: AwardCost {
                miles_required: record.miles_required,
                taxes_and_fees: record.taxes_fees,
                seats_available: record.seats_available,
            },
            value,
            transfer,
        }
    }
}

/// One entry in a leg's ranked list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RankedResult {
    Cash(CashResult),
    Award(AwardResult),
}

impl RankedResult {
    /// `Some(cpp)` when this is an award at or above the high-value threshold.
    fn high_value_award(&self) -> Option<f64> {
        match self {
            RankedResult::Award(a) if a.value.cents_per_point >= HIGH_VALUE_CENTS_PER_POINT => {
                Some(a.value.cents_per_point)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Comparator
// ---------------------------------------------------------------------------

/// Compare two results under the three-case ranking rule.
///
/// `Less` means `a` is listed before `b`. This relation is deliberately not a
/// total order across types (two cash fares can both tie with one award), so
/// use [`rank`] rather than passing it to `sort_by` directly.
pub fn compare(a: &RankedResult, b: &RankedResult) -> Ordering {
    match (a, b) {
        (RankedResult::Award(x), RankedResult::Award(y)) => y
            .value
            .cents_per_point
            .total_cmp(&x.value.cents_per_point),
        (RankedResult::Cash(x), RankedResult::Cash(y)) => x.price.amount.total_cmp(&y.price.amount),
        (RankedResult::Award(_), RankedResult::Cash(_)) => {
            if a.high_value_award().is_some() {
                Ordering::Less
            } else {
                Ordering::Equal
            }
        }
        (RankedResult::Cash(_), RankedResult::Award(_)) => {
            if b.high_value_award().is_some() {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Order a merged list of cash and award results.
///
/// High-value awards come first (by cents-per-point, descending). The
/// remaining cash fares and awards keep the block order in which their type
/// first appeared in `results`, each block sorted by its own metric. For the
/// engine's input (cash block, then award block) this is exactly the stable
/// outcome of [`compare`]: every non-`Equal` pair is honoured, and equal-rank
/// cross-type pairs keep insertion order.
pub fn rank(mut results: Vec<RankedResult>) -> Vec<RankedResult> {
    let cash_block_first = results
        .iter()
        .find(|r| r.high_value_award().is_none())
        .map_or(true, |r| matches!(r, RankedResult::Cash(_)));

    let group = |r: &RankedResult| -> u8 {
        match r {
            _ if r.high_value_award().is_some() => 0,
            RankedResult::Cash(_) if cash_block_first => 1,
            RankedResult::Award(_) if cash_block_first => 2,
            RankedResult::Award(_) => 1,
            RankedResult::Cash(_) => 2,
        }
    };

    results.sort_by(|a, b| group(a).cmp(&group(b)).then_with(|| compare(a, b)));
    results
}
