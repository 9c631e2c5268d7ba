//! Metro-area expansion for airport codes.
//!
//! A multi-airport metro code matches rows from any of its member airports.
//! Lookups are an OR over the expansion, never a product requiring all.

use crate::error::CoreError;

/// The only supported destination metro.
pub const DESTINATION_METRO: &str = "TYO";

/// Known multi-airport metro codes and their member airports.
const METRO_AIRPORTS: &[(&str, &[&str])] = &[("NYC", &["JFK", "EWR"]), ("TYO", &["NRT", "HND"])];

/// Expand a metro code into its member airports.
///
/// Plain airport codes expand to themselves.
pub fn expand(code: &str) -> Vec<String> {
    METRO_AIRPORTS
        .iter()
        .find(|(metro, _)| *metro == code)
        .map(|(_, airports)| airports.iter().map(|a| a.to_string()).collect())
        .unwrap_or_else(|| vec![code.to_string()])
}

/// Whether `code` names a multi-airport metro area.
pub fn is_metro(code: &str) -> bool {
    METRO_AIRPORTS.iter().any(|(metro, _)| *metro == code)
}

/// Normalize a user-supplied airport or metro code to upper case.
///
/// Codes must be exactly three ASCII letters.
pub fn normalize_code(code: &str) -> Result<String, CoreError> {
    let trimmed = code.trim();
    if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::Validation(format!(
            "Invalid airport code '{trimmed}'. Expected a 3-letter IATA or metro code"
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}
