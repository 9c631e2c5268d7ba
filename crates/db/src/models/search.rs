//! Search log DTO.

use awardfare_core::search::SearchRequest;
use awardfare_core::types::DbId;
use awardfare_core::usage::Identity;
use chrono::NaiveDate;

/// DTO for inserting into the `searches` table.
#[derive(Debug, Clone)]
pub struct CreateSearchLog {
    pub search_id: String,
    pub user_id: Option<DbId>,
    pub ip_address: Option<String>,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub cabin_class: String,
    pub passengers: i32,
    pub payment_type: String,
    pub selected_programs: Vec<String>,
}

impl CreateSearchLog {
    pub fn new(search_id: &str, identity: &Identity, request: &SearchRequest) -> Self {
        let ip_address = match identity {
            Identity::Ip(ip) => Some(ip.clone()),
            Identity::User(_) => None,
        };
        Self {
            search_id: search_id.to_string(),
            user_id: identity.user_id(),
            ip_address,
            origin: request.origin.clone(),
            destination: request.destination.clone(),
            departure_date: request.departure_date,
            return_date: request.return_date,
            cabin_class: request.cabin_class.as_str().to_string(),
            passengers: i32::from(request.passengers),
            payment_type: request.payment_mode.as_str().to_string(),
            selected_programs: request.held_programs.clone(),
        }
    }
}
