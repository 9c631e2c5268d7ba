//! Bearer-token verification.
//!
//! Tokens are HS256 JWTs issued by the account service after login and
//! after each subscription change, so the `tier` claim is authoritative
//! until the token expires. This service only verifies them; signing is
//! compiled in for tests (`testkit`).

use awardfare_core::error::CoreError;
use awardfare_core::types::DbId;
use awardfare_core::usage::Tier;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims this service reads from an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id in the accounts database.
    pub sub: DbId,
    /// Plan name as issued (`"free"` or `"pro"`).
    pub tier: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    /// Unknown plan names are treated as free.
    pub fn tier(&self) -> Tier {
        Tier::from_name(&self.tier)
    }
}

/// Verification settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret with the account service.
    pub secret: String,
    /// Lifetime of tokens signed by [`generate_access_token`].
    pub access_token_expiry_mins: i64,
}

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;

impl JwtConfig {
    /// | Env Var                  | Required | Default |
    /// |--------------------------|----------|---------|
    /// | `JWT_SECRET`             | no       | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS` | no       | `15`    |
    ///
    /// `None` when `JWT_SECRET` is unset or empty; every caller is then
    /// anonymous.
    pub fn from_env() -> Option<Self> {
        let secret = std::env::var("JWT_SECRET").ok().filter(|s| !s.is_empty())?;

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        Some(Self {
            secret,
            access_token_expiry_mins,
        })
    }
}

/// Verify an `Authorization` header value of the form `Bearer <token>`.
pub fn verify_bearer(header: &str, config: &JwtConfig) -> Result<Claims, CoreError> {
    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        CoreError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".into())
    })?;

    validate_token(token.trim(), config).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        CoreError::Unauthorized("Invalid or expired token".into())
    })
}

/// Decode `token`, checking the HS256 signature, `exp` and the presence of `sub`.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

/// Sign a token the way the account service does.
#[cfg(any(test, feature = "testkit"))]
pub fn generate_access_token(
    user_id: DbId,
    tier: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        tier: tier.to_string(),
        exp: now + config.access_token_expiry_mins * 60,
        iat: now,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}
