use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::guard::rate_limit_guard;
use crate::handlers::{check_handler, health_handler, metrics_handler, status_handler};
use crate::state::AppState;

// Build the router; every /api route sits behind the rate limit guard
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/limit/check", post(check_handler))
        .route("/limit/status/{identifier}", get(status_handler))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            rate_limit_guard,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .nest("/api", api)
        .with_state(state)
}
