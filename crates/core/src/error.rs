use crate::usage::UsageDenial;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{}", .0.message())]
    UsageDenied(UsageDenial),

    #[error("Upstream unavailable: {dependency}: {message}")]
    UpstreamUnavailable {
        dependency: &'static str,
        message: String,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable machine-readable code surfaced to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::UsageDenied(denial) => denial.code(),
            CoreError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            CoreError::Unauthorized(_) => "UNAUTHORIZED",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
