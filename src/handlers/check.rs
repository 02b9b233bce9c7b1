use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use crate::error::{AppError, LimitError};
use crate::guard::apply_limit_headers;
use crate::models::{CheckRequest, CheckResponse};
use crate::rate_limit::{RateLimitConfig, namespaced};
use crate::state::AppState;

// Identifiers from the check API live apart from the guard's keys
pub const EXTERNAL_NAMESPACE: &str = "ext";

// Store key for a caller-supplied identifier, surrounding whitespace ignored
pub(crate) fn external_key(identifier: &str) -> Result<String, LimitError> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(LimitError::EmptyIdentifier);
    }
    Ok(namespaced(EXTERNAL_NAMESPACE, identifier))
}

pub async fn check_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CheckRequest>,
) -> Result<Response, AppError> {
    let key = external_key(&payload.identifier)?;

    // unbounded windows would never expire and never be swept
    let window_ms = payload.window_ms.unwrap_or(state.policy.window_ms());
    if window_ms > state.max_window_ms {
        return Err(AppError::InvalidInput(format!(
            "window_ms {} exceeds the maximum of {}",
            window_ms, state.max_window_ms
        )));
    }

    let config = RateLimitConfig::new(
        window_ms,
        payload.max_requests.unwrap_or(state.policy.max_requests()),
    )?;

    let admitted = state.store.check_limit(&key, &config);
    let status = state.store.get_status(&key);
    debug!(identifier = %key, admitted, "check");

    let code = if admitted {
        StatusCode::OK
    } else {
        StatusCode::TOO_MANY_REQUESTS
    };
    let mut response = (code, Json(CheckResponse { admitted, status })).into_response();
    if let Some(status) = status {
        apply_limit_headers(response.headers_mut(), &status, state.store.now_ms(), !admitted);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_key_trims_and_namespaces() {
        assert_eq!(external_key(" u1 ").unwrap(), "ext:u1");
        assert_eq!(external_key("u1").unwrap(), external_key("\tu1").unwrap());
    }

    #[test]
    fn external_key_rejects_blank() {
        assert_eq!(external_key("   "), Err(LimitError::EmptyIdentifier));
    }
}
