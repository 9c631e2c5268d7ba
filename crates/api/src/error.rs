use awardfare_core::error::CoreError;
use awardfare_core::usage::UsageDenial;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `awardfare_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A request body that could not be read as JSON.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::UsageDenied(denial) => {
                    return usage_denied_response(denial);
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::UpstreamUnavailable { dependency, message } => {
                    tracing::error!(dependency = *dependency, error = %message, "Upstream unavailable");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "UPSTREAM_UNAVAILABLE",
                        "Flight data is temporarily unavailable. Please try again shortly."
                            .to_string(),
                    )
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Usage denials carry the upgrade link alongside the usual fields.
fn usage_denied_response(denial: &UsageDenial) -> Response {
    let status = match denial {
        UsageDenial::SearchLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        UsageDenial::DateRangeExceeded { .. } => StatusCode::BAD_REQUEST,
    };

    let body = json!({
        "error": denial.message(),
        "code": denial.code(),
        "upgradeUrl": denial.upgrade_url(),
    });

    (status, axum::Json(body)).into_response()
}
