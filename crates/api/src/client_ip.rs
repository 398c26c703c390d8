//! Caller address extraction and the per-IP gate.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use pipeline::{normalize_ip, Policy};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Header a trusted proxy puts the original client address in.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Identity used when no address is known.
const UNKNOWN: &str = "unknown";

/// Normalized address of the caller, IPv4-mapped IPv6 collapsed to IPv4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

/// Resolve the caller address.
///
/// The first `X-Forwarded-For` entry wins only when `trust_forwarded_for`
/// is set. Otherwise the socket peer is used.
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> String {
    let forwarded = trust_forwarded_for
        .then(|| headers.get(FORWARDED_FOR))
        .flatten()
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match (forwarded, peer) {
        (Some(forwarded), _) => normalize_ip(forwarded),
        (None, Some(peer)) => normalize_ip(&peer.ip().to_string()),
        (None, None) => UNKNOWN.to_string(),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientIp(resolve_client_ip(&parts.headers, peer, state.trust_forwarded_for)))
    }
}

/// Middleware counting every request against [`Policy::OAUTH_IP`] for the caller address.
pub async fn ip_gate(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    debug!(ip = %ip, path = %request.uri().path(), "IP gate");
    state.enforce(&ip, &Policy::OAUTH_IP).await?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer(raw: &str) -> Option<SocketAddr> {
        Some(raw.parse().unwrap())
    }

    #[test]
    fn test_peer_is_normalized() {
        let headers = HeaderMap::new();
        assert_eq!(resolve_client_ip(&headers, peer("[::ffff:1.2.3.4]:5000"), false), "1.2.3.4");
        assert_eq!(resolve_client_ip(&headers, peer("1.2.3.4:6000"), false), "1.2.3.4");
        assert_eq!(resolve_client_ip(&headers, peer("[2001:db8::1]:443"), false), "2001:db8::1");
        assert_eq!(resolve_client_ip(&headers, None, false), "unknown");
    }

    #[test]
    fn test_forwarded_for_needs_trust() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static("::ffff:9.9.9.9, 10.0.0.1"));

        assert_eq!(resolve_client_ip(&headers, peer("10.0.0.1:80"), false), "10.0.0.1");
        assert_eq!(resolve_client_ip(&headers, peer("10.0.0.1:80"), true), "9.9.9.9");

        headers.insert(FORWARDED_FOR, HeaderValue::from_static(" "));
        assert_eq!(resolve_client_ip(&headers, peer("10.0.0.1:80"), true), "10.0.0.1");
    }
}
