use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::error::AppError;
use crate::rate_limit::RateLimitStatus;
use crate::state::AppState;

use super::check::external_key;

pub async fn status_handler(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<Json<RateLimitStatus>, AppError> {
    let key = external_key(&identifier)?;
    state
        .store
        .get_status(&key)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no live window for {}", identifier.trim())))
}
