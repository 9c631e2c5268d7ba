//! Usage Policy Gate: per-identity monthly search caps and date horizons.
//!
//! The limit check is a read and the increment happens only after admission,
//! so the Nth search is the last one admitted under a cap of N. The two are
//! not sequenced against concurrent requests from the same identity: at the
//! boundary, more than the nominal cap may be admitted in a month. That race
//! is accepted.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::repository::RepositoryError;
use crate::types::{DbId, Timestamp};

/// Where a free-tier user is sent to lift a limit.
pub const UPGRADE_URL: &str = "/pricing";

// ---------------------------------------------------------------------------
// Identity and tier
// ---------------------------------------------------------------------------

/// Who is searching. An authenticated user takes precedence over the IP.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    User(DbId),
    Ip(String),
}

impl Identity {
    /// Stable string form, e.g. `user:42` or `ip:203.0.113.7`.
    pub fn key(&self) -> String {
        match self {
            Identity::User(id) => format!("user:{id}"),
            Identity::Ip(ip) => format!("ip:{ip}"),
        }
    }

    pub fn user_id(&self) -> Option<DbId> {
        match self {
            Identity::User(id) => Some(*id),
            Identity::Ip(_) => None,
        }
    }
}

/// Subscription tier, resolved by the caller from session state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Free,
    Pro,
}

impl Tier {
    /// Unknown tier names are treated as free.
    pub fn from_name(name: &str) -> Self {
        match name {
            "pro" => Tier::Pro,
            _ => Tier::Free,
        }
    }
}

/// Calendar-month bucket for usage counters, `YYYY-MM` in UTC.
pub fn month_key(now: Timestamp) -> String {
    now.format("%Y-%m").to_string()
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Monthly search counters. `increment` must be an atomic upsert.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn search_count(&self, identity: &Identity, month: &str)
        -> Result<i64, RepositoryError>;

    /// Add one search and return the new count.
    async fn increment(&self, identity: &Identity, month: &str) -> Result<i64, RepositoryError>;
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Tier limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsagePolicy {
    pub free_monthly_searches: i64,
    pub free_horizon_days: u64,
    pub pro_horizon_days: u64,
}

impl Default for UsagePolicy {
    fn default() -> Self {
        Self {
            free_monthly_searches: 10,
            free_horizon_days: 60,
            pro_horizon_days: 365,
        }
    }
}

impl UsagePolicy {
    /// `None` means unlimited.
    pub fn monthly_limit(&self, tier: Tier) -> Option<i64> {
        match tier {
            Tier::Free => Some(self.free_monthly_searches),
            Tier::Pro => None,
        }
    }

    pub fn horizon_days(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Free => self.free_horizon_days,
            Tier::Pro => self.pro_horizon_days,
        }
    }
}

/// Why a search was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageDenial {
    SearchLimitExceeded { limit: i64 },
    DateRangeExceeded { max_days: u64 },
}

impl UsageDenial {
    pub fn code(&self) -> &'static str {
        match self {
            UsageDenial::SearchLimitExceeded { .. } => "SEARCH_LIMIT_EXCEEDED",
            UsageDenial::DateRangeExceeded { .. } => "DATE_RANGE_EXCEEDED",
        }
    }

    /// User-facing message including the upgrade hint.
    pub fn message(&self) -> String {
        match self {
            UsageDenial::SearchLimitExceeded { limit } => format!(
                "Free tier limited to {limit} searches per month. Upgrade to Pro for unlimited searches."
            ),
            UsageDenial::DateRangeExceeded { max_days } => format!(
                "Your plan is limited to searching {max_days} days ahead. Upgrade to Pro for 12 months."
            ),
        }
    }

    pub fn upgrade_url(&self) -> &'static str {
        UPGRADE_URL
    }
}

/// Outcome of [`UsageGate::check_and_admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Admitted; the identity's count for the month after this search.
    Admitted { searches_this_month: i64 },
    Denied(UsageDenial),
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Enforces [`UsagePolicy`] against a [`UsageStore`].
pub struct UsageGate {
    store: Arc<dyn UsageStore>,
    policy: UsagePolicy,
}

impl UsageGate {
    pub fn new(store: Arc<dyn UsageStore>, policy: UsagePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &UsagePolicy {
        &self.policy
    }

    /// Admit or deny one logical search, incrementing the counter on admission.
    ///
    /// Call exactly once per search: two calls count two searches. A store
    /// failure while reading the count is `UpstreamUnavailable`; a failure
    /// while incrementing is logged and the search is still admitted.
    pub async fn check_and_admit(
        &self,
        identity: &Identity,
        departure_date: NaiveDate,
        tier: Tier,
        now: Timestamp,
    ) -> Result<Admission, CoreError> {
        let month = month_key(now);

        if let Some(limit) = self.policy.monthly_limit(tier) {
            let used = self
                .store
                .search_count(identity, &month)
                .await
                .map_err(|e| CoreError::UpstreamUnavailable {
                    dependency: "usage_store",
                    message: e.to_string(),
                })?;
            if used >= limit {
                tracing::info!(identity = %identity.key(), used, limit, "Search limit reached");
                return Ok(Admission::Denied(UsageDenial::SearchLimitExceeded { limit }));
            }
        }

        let max_days = self.policy.horizon_days(tier);
        let today = now.date_naive();
        let horizon = today.checked_add_days(Days::new(max_days)).unwrap_or(NaiveDate::MAX);
        if departure_date > horizon {
            tracing::info!(
                identity = %identity.key(),
                %departure_date,
                max_days,
                "Departure date beyond plan horizon",
            );
            return Ok(Admission::Denied(UsageDenial::DateRangeExceeded { max_days }));
        }

        let searches_this_month = match self.store.increment(identity, &month).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(identity = %identity.key(), error = %e, "Failed to record search usage");
                0
            }
        };

        Ok(Admission::Admitted {
            searches_this_month,
        })
    }
}
