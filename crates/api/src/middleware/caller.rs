//! Caller identity and tier resolution.
//!
//! A valid `Authorization: Bearer` token identifies a user and carries their
//! tier. Without one the caller is an anonymous free-tier client keyed by IP:
//! the first `x-forwarded-for` hop, else the socket peer address.

use std::net::SocketAddr;

use awardfare_core::error::CoreError;
use awardfare_core::usage::{Identity, Tier};
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::jwt::verify_bearer;
use crate::error::AppError;
use crate::state::AppState;

/// Placeholder IP when neither a forwarded header nor peer address is known.
const UNKNOWN_IP: &str = "unknown";

/// Who is calling and on which plan.
///
/// ```ignore
/// async fn my_handler(caller: Caller) -> AppResult<Json<()>> {
///     tracing::info!(identity = %caller.identity.key(), "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub identity: Identity,
    pub tier: Tier,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Without a configured secret every caller is anonymous.
        if let Some(jwt) = &state.config.jwt {
            if let Some(header) = parts.headers.get(AUTHORIZATION) {
                let header = header.to_str().map_err(|_| {
                    CoreError::Unauthorized("Authorization header is not valid ASCII".into())
                })?;
                let claims = verify_bearer(header, jwt)?;

                return Ok(Caller {
                    identity: Identity::User(claims.sub),
                    tier: claims.tier(),
                });
            }
        }

        Ok(Caller {
            identity: Identity::Ip(client_ip(parts)),
            tier: Tier::Free,
        })
    }
}

fn client_ip(parts: &Parts) -> String {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn first_forwarded_hop_wins() {
        let p = parts(
            Request::builder().header("x-forwarded-for", " 203.0.113.7 , 10.0.0.1"),
        );
        assert_eq!(client_ip(&p), "203.0.113.7");
    }

    #[test]
    fn peer_address_is_the_fallback() {
        let mut p = parts(Request::builder());
        p.extensions
            .insert(ConnectInfo(SocketAddr::from(([198, 51, 100, 4], 5555))));
        assert_eq!(client_ip(&p), "198.51.100.4");
    }

    #[test]
    fn unknown_without_any_source() {
        assert_eq!(client_ip(&parts(Request::builder())), UNKNOWN_IP);
    }
}
