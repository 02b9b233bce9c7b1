use axum::{extract::State, response::IntoResponse};
use std::sync::Arc;

use crate::metrics::{STORE_ENTRIES, render};
use crate::state::AppState;

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // gauge is otherwise only refreshed by the sweeper
    STORE_ENTRIES.set(state.store.len() as f64);
    render()
}
