use std::sync::Arc;

use crate::config::Args;
use crate::error::LimitError;
use crate::rate_limit::{RateLimitConfig, RateLimitStore};

// app's shared state
pub struct AppState {
    pub store: Arc<RateLimitStore>,
    pub policy: RateLimitConfig,       // default for check requests
    pub guard_policy: RateLimitConfig, // per-client limit on /api
    pub max_window_ms: u64,
    pub trust_forwarded: bool,
}

impl AppState {
    pub fn from_args(store: Arc<RateLimitStore>, args: &Args) -> Result<Self, LimitError> {
        Ok(Self {
            store,
            policy: args.policy()?,
            guard_policy: args.guard_policy()?,
            max_window_ms: args.max_window_ms,
            trust_forwarded: args.trust_forwarded,
        })
    }
}
