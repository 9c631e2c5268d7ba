use std::time::Duration;

use awardfare_core::engine::EngineConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Redis URL for the result cache. `None` selects the in-process cache.
    pub redis_url: Option<String>,
    /// Per-call cache timeout in milliseconds (default: `250`).
    pub cache_timeout_ms: u64,
    /// Per-call repository timeout in milliseconds (default: `5000`).
    pub repository_timeout_ms: u64,
    /// Bearer token verification. `None` treats every caller as anonymous.
    pub jwt: Option<JwtConfig>,
    /// Housekeeping cadence in seconds (default: `3600`).
    pub purge_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `REDIS_URL`             | unset                   |
    /// | `CACHE_TIMEOUT_MS`      | `250`                   |
    /// | `REPOSITORY_TIMEOUT_MS` | `5000`                  |
    /// | `JWT_SECRET`            | unset                   |
    /// | `PURGE_INTERVAL_SECS`   | `3600`                  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let redis_url = std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty());

        let cache_timeout_ms: u64 = std::env::var("CACHE_TIMEOUT_MS")
            .unwrap_or_else(|_| "250".into())
            .parse()
            .expect("CACHE_TIMEOUT_MS must be a valid u64");

        let repository_timeout_ms: u64 = std::env::var("REPOSITORY_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("REPOSITORY_TIMEOUT_MS must be a valid u64");

        let purge_interval_secs: u64 = std::env::var("PURGE_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("PURGE_INTERVAL_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            redis_url,
            cache_timeout_ms,
            repository_timeout_ms,
            jwt: JwtConfig::from_env(),
            purge_interval_secs,
        }
    }

    /// Dependency timeouts for the aggregation engine.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            cache_timeout: Duration::from_millis(self.cache_timeout_ms),
            repository_timeout: Duration::from_millis(self.repository_timeout_ms),
        }
    }
}
