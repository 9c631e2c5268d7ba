pub mod health;
pub mod search;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /search                                    run a search (POST)
/// /search/transfer-partners/{program}        transfer edges out of a program (GET)
/// /search/valuations                         per-cabin point valuations (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/search", search::router())
}
