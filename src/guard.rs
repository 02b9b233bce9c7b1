use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use crate::metrics::REQUEST_LATENCY;
use crate::rate_limit::{RateLimitStatus, namespaced};
use crate::state::AppState;

pub const GUARD_NAMESPACE: &str = "api";

pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub static X_RATELIMIT_REMAINING: HeaderName =
    HeaderName::from_static("x-ratelimit-remaining");
pub static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

// Client identity for the guard: peer address, or the first forwarded address when the
// proxy in front of us is trusted to set it
pub fn client_key(request: &Request, trust_forwarded: bool) -> String {
    if trust_forwarded {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(addr) = forwarded {
            return addr.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "anonymous".to_string())
}

// Seconds until the window resets, rounded up, at least 1
pub fn retry_after_secs(status: &RateLimitStatus, now: i64) -> u64 {
    let ms = status.reset_at.saturating_sub(now).max(0) as u64;
    ms.div_ceil(1000).max(1)
}

pub fn apply_limit_headers(
    headers: &mut HeaderMap,
    status: &RateLimitStatus,
    now: i64,
    rejected: bool,
) {
    headers.insert(X_RATELIMIT_LIMIT.clone(), HeaderValue::from(status.total));
    headers.insert(X_RATELIMIT_REMAINING.clone(), HeaderValue::from(status.remaining));
    headers.insert(X_RATELIMIT_RESET.clone(), HeaderValue::from(status.reset_at));
    if rejected {
        let retry_after = HeaderValue::from(retry_after_secs(status, now));
        headers.insert(header::RETRY_AFTER, retry_after);
    }
}

/// Middleware that rate limits every request it wraps, keyed by client address.
pub async fn rate_limit_guard(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let client = client_key(&request, state.trust_forwarded);
    let key = namespaced(GUARD_NAMESPACE, &client);

    if !state.store.check_limit(&key, &state.guard_policy) {
        warn!(client = %key, path = %request.uri().path(), "API rate limit exceeded");
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "Rate limit exceeded. Try again later.",
                "code": StatusCode::TOO_MANY_REQUESTS.as_u16()
            })),
        )
            .into_response();
        if let Some(status) = state.store.get_status(&key) {
            apply_limit_headers(response.headers_mut(), &status, state.store.now_ms(), true);
        }
        return response;
    }

    let mut response = next.run(request).await;

    // handlers that report their own window keep their headers
    if response.headers().contains_key(&X_RATELIMIT_LIMIT) {
        REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
        return response;
    }
    if let Some(status) = state.store.get_status(&key) {
        apply_limit_headers(response.headers_mut(), &status, state.store.now_ms(), false);
    }
    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http;

    fn request_with(headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::builder().uri("/api/limit/check");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn with_peer(mut request: Request, peer: &str) -> Request {
        let addr: SocketAddr = peer.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    #[test]
    fn trusted_client_key_prefers_first_forwarded_address() {
        let request = with_peer(
            request_with(&[("x-forwarded-for", " 10.0.0.7 , 172.16.0.1")]),
            "192.168.1.20:5555",
        );
        assert_eq!(client_key(&request, true), "10.0.0.7");
    }

    #[test]
    fn untrusted_client_key_ignores_forwarded_header() {
        let request = with_peer(
            request_with(&[("x-forwarded-for", "10.0.0.7")]),
            "192.168.1.20:5555",
        );
        assert_eq!(client_key(&request, false), "192.168.1.20");
    }

    #[test]
    fn client_key_falls_back_to_anonymous() {
        let request = request_with(&[("x-forwarded-for", "")]);
        assert_eq!(client_key(&request, true), "anonymous");
        assert_eq!(client_key(&request_with(&[]), false), "anonymous");
    }

    #[test]
    fn retry_after_rounds_up() {
        let status = RateLimitStatus {
            remaining: 0,
            reset_at: 2_500,
            total: 3,
        };
        assert_eq!(retry_after_secs(&status, 1_000), 2);
        assert_eq!(retry_after_secs(&status, 2_500), 1);
        assert_eq!(retry_after_secs(&status, 9_000), 1);
    }

    #[test]
    fn rejected_headers_include_retry_after() {
        let status = RateLimitStatus {
            remaining: 0,
            reset_at: 61_000,
            total: 10,
        };
        let mut headers = HeaderMap::new();

        apply_limit_headers(&mut headers, &status, 1_000, true);
        assert_eq!(headers[&X_RATELIMIT_LIMIT], "10");
        assert_eq!(headers[&X_RATELIMIT_REMAINING], "0");
        assert_eq!(headers[&X_RATELIMIT_RESET], "61000");
        assert_eq!(headers[header::RETRY_AFTER], "60");
    }
}
