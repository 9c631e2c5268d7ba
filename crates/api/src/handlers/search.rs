//! Handlers for flight search and catalog reads.

use awardfare_core::catalog::{PointsValuation, TransferPartner};
use awardfare_core::error::CoreError;
use awardfare_core::search::{SearchInput, SearchResponse};
use awardfare_core::usage::Admission;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::caller::Caller;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// POST /api/v1/search
///
/// Validate the request, admit it against the caller's plan, log it, then
/// aggregate cash and award results for the outbound and (optional) return
/// legs.
pub async fn perform_search(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<SearchInput>, JsonRejection>,
) -> AppResult<Json<SearchResponse>> {
    let Json(input) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let now = Utc::now();
    let request = input.validate(now.date_naive())?;

    let searches_this_month = match state
        .usage
        .check_and_admit(&caller.identity, request.departure_date, caller.tier, now)
        .await?
    {
        Admission::Admitted {
            searches_this_month,
        } => searches_this_month,
        Admission::Denied(denial) => return Err(CoreError::UsageDenied(denial).into()),
    };

    let search_id = Uuid::new_v4().to_string();

    {
        let history = state.history.clone();
        let search_id = search_id.clone();
        let identity = caller.identity.clone();
        let request = request.clone();
        tokio::spawn(async move {
            if let Err(e) = history.record(&search_id, &identity, &request).await {
                tracing::warn!(search_id = %search_id, error = %e, "Failed to record search");
            }
        });
    }

    let response = state.engine.perform_search(&request, search_id).await?;

    tracing::info!(
        search_id = %response.search_id,
        identity = %caller.identity.key(),
        origin = %request.origin,
        cabin = %request.cabin_class,
        outbound = response.outbound.len(),
        inbound = response.return_results.len(),
        searches_this_month,
        "Search completed",
    );

    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TransferPartnersResponse {
    pub program: String,
    pub partners: Vec<TransferPartner>,
}

/// GET /api/v1/search/transfer-partners/{program}
///
/// Direct transfer edges out of `program`; empty for unknown programs.
pub async fn transfer_partners(
    State(state): State<AppState>,
    Path(program): Path<String>,
) -> Json<TransferPartnersResponse> {
    let partners = state.engine.catalog().partners_of(&program);
    Json(TransferPartnersResponse { program, partners })
}

#[derive(Debug, Serialize)]
pub struct ValuationsResponse {
    pub valuations: Vec<PointsValuation>,
}

/// GET /api/v1/search/valuations
pub async fn list_valuations(State(state): State<AppState>) -> Json<ValuationsResponse> {
    Json(ValuationsResponse {
        valuations: state.engine.catalog().all_valuations(),
    })
}
