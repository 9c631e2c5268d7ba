use std::sync::Arc;

use awardfare_core::engine::AggregationEngine;
use awardfare_core::history::SearchHistory;
use awardfare_core::usage::UsageGate;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Cache-aside search over the fare and award stores.
    pub engine: Arc<AggregationEngine>,
    /// Monthly caps and date horizons.
    pub usage: Arc<UsageGate>,
    /// Search log, written fire-and-forget after admission.
    pub history: Arc<dyn SearchHistory>,
}
