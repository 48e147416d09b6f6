// Rate limit enforcement at the HTTP boundary.
//
// Handlers extract a ClientId, call enforce() against their endpoint's
// limiter, and return the prepared 429 response on rejection.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use chrono::{DateTime, SecondsFormat};
use tracing::warn;

use super::api_error;
use crate::ratelimit::{now_millis, EndpointLimiter, RateLimitDecision};

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Identifier the limiters partition on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0);
        Ok(ClientId(client_identifier(&parts.headers, peer)))
    }
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer.
pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => "anonymous".to_string(),
    }
}

/// Check `identifier` against `limiter`. On rejection returns the 429
/// response to send back.
pub fn enforce(limiter: &EndpointLimiter, identifier: &str) -> Result<RateLimitDecision, Response> {
    let now_ms = now_millis();
    let decision = limiter.check_at(identifier, now_ms);
    if decision.success {
        return Ok(decision);
    }

    warn!(
        endpoint = limiter.name(),
        client = identifier,
        reset_at = decision.reset_at,
        "Rate limit exceeded"
    );
    Err(too_many_requests(&decision, now_ms))
}

/// 429 with `X-RateLimit-Limit`, `X-RateLimit-Remaining`,
/// `X-RateLimit-Reset` (ISO-8601) and `Retry-After` (whole seconds).
pub fn too_many_requests(decision: &RateLimitDecision, now_ms: i64) -> Response {
    let mut response = api_error(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded");
    let headers = response.headers_mut();

    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    if let Some(reset) = DateTime::from_timestamp_millis(decision.reset_at) {
        if let Ok(value) = HeaderValue::from_str(&reset.to_rfc3339_opts(SecondsFormat::Millis, true)) {
            headers.insert(X_RATELIMIT_RESET, value);
        }
    }
    headers.insert(
        header::RETRY_AFTER,
        HeaderValue::from(retry_after_secs(decision.reset_at, now_ms)),
    );

    response
}

/// `ceil((reset_at - now) / 1000)`, never negative.
pub fn retry_after_secs(reset_at: i64, now_ms: i64) -> i64 {
    let wait_ms = reset_at.saturating_sub(now_ms).max(0);
    wait_ms / 1000 + i64::from(wait_ms % 1000 != 0)
}
