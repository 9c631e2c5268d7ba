//! Search request/response shapes and request validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::flight::{CabinClass, PaymentMode};
use crate::metro::{expand, normalize_code, DESTINATION_METRO};
use crate::ranking::RankedResult;

/// Largest party a single search may request.
pub const MAX_PASSENGERS: u8 = 9;

/// Request body as received from the HTTP layer, before validation.
///
/// Accepts both `paymentType`/`selectedPrograms` and
/// `paymentMode`/`heldPrograms` spellings. Enumerated and numeric fields stay
/// loosely typed here so a bad value is reported by [`SearchInput::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchInput {
    pub origin: Option<String>,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub cabin_class: Option<String>,
    pub passengers: Option<Value>,
    #[serde(alias = "paymentMode")]
    pub payment_type: Option<String>,
    #[serde(alias = "heldPrograms")]
    pub selected_programs: Option<Vec<String>>,
}

/// A validated search. Destination is always the supported metro.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub cabin_class: CabinClass,
    pub passengers: u8,
    pub payment_mode: PaymentMode,
    pub held_programs: Vec<String>,
}

impl SearchInput {
    /// Validate against `today` (UTC) and apply defaults.
    pub fn validate(self, today: NaiveDate) -> Result<SearchRequest, CoreError> {
        let (Some(origin), Some(departure_date)) = (self.origin, self.departure_date) else {
            return Err(CoreError::Validation(
                "Origin and departure date are required".into(),
            ));
        };

        let origin = normalize_code(&origin)?;
        if origin == DESTINATION_METRO || expand(DESTINATION_METRO).contains(&origin) {
            return Err(CoreError::Validation(format!(
                "Origin {origin} is in the destination metro {DESTINATION_METRO}"
            )));
        }
        let departure_date = parse_date("departureDate", &departure_date)?;
        if departure_date < today {
            return Err(CoreError::Validation(format!(
                "departureDate {departure_date} is in the past"
            )));
        }

        let return_date = match self.return_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let date = parse_date("returnDate", raw)?;
                if date < departure_date {
                    return Err(CoreError::Validation(
                        "returnDate must not be before departureDate".into(),
                    ));
                }
                Some(date)
            }
        };

        let passengers = match self.passengers {
            None | Some(Value::Null) => 1,
            Some(raw) => parse_passengers(&raw)?,
        };

        let cabin_class = match self.cabin_class.as_deref() {
            None => CabinClass::default(),
            Some(name) => CabinClass::from_name(name.trim())?,
        };

        let payment_mode = match self.payment_type.as_deref() {
            None => PaymentMode::default(),
            Some(name) => PaymentMode::from_name(name.trim())?,
        };

        let mut held_programs: Vec<String> = Vec::new();
        for program in self.selected_programs.unwrap_or_default() {
            let program = program.trim().to_string();
            if !program.is_empty() && !held_programs.contains(&program) {
                held_programs.push(program);
            }
        }

        Ok(SearchRequest {
            origin,
            destination: DESTINATION_METRO.to_string(),
            departure_date,
            return_date,
            cabin_class,
            passengers,
            payment_mode,
            held_programs,
        })
    }
}

/// Whole numbers, given as JSON numbers or numeric strings, in `1..=9`.
fn parse_passengers(raw: &Value) -> Result<u8, CoreError> {
    let count = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match count {
        Some(n) if (1..=i64::from(MAX_PASSENGERS)).contains(&n) => Ok(n as u8),
        _ => Err(CoreError::Validation(format!(
            "passengers must be a whole number between 1 and {MAX_PASSENGERS}, got {raw}"
        ))),
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        CoreError::Validation(format!("{field} must be a date in YYYY-MM-DD format"))
    })
}

/// Results for one search. `unavailable` names the `leg.source` lookups
/// (e.g. `outbound.cash`) that failed upstream and are missing from the lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub search_id: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub cabin_class: CabinClass,
    pub passengers: u8,
    pub outbound: Vec<RankedResult>,
    #[serde(rename = "return")]
    pub return_results: Vec<RankedResult>,
    pub unavailable: Vec<String>,
}
