//! Route definitions for flight search and its reference data.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::search;
use crate::state::AppState;

/// Search routes mounted at `/search`.
///
/// ```text
/// POST /                            -> perform_search
/// GET  /transfer-partners/{program} -> transfer_partners
/// GET  /valuations                  -> list_valuations
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(search::perform_search))
        .route(
            "/transfer-partners/{program}",
            get(search::transfer_partners),
        )
        .route("/valuations", get(search::list_valuations))
}
