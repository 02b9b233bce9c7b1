use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Invalid limiter input, caught before it reaches the store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LimitError {
    #[error("window must be longer than zero milliseconds")]
    ZeroWindow,

    #[error("max requests must be at least 1")]
    ZeroMaxRequests,

    #[error("identifier must not be empty")]
    EmptyIdentifier,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid limit: {0}")]
    Limit(#[from] LimitError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidInput(_) | AppError::Limit(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_errors_map_to_bad_request() {
        let response = AppError::from(LimitError::ZeroWindow).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = AppError::NotFound("ext:u1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn error_display_mentions_cause() {
        let msg = AppError::from(LimitError::ZeroMaxRequests).to_string();
        assert!(msg.contains("at least 1"));
    }
}
