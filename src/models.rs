use serde::{Deserialize, Serialize};

use crate::rate_limit::RateLimitStatus;

// Check request from an external caller; missing limits fall back to the server policy
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct CheckRequest {
    pub identifier: String,
    #[serde(default)]
    pub window_ms: Option<u64>,
    #[serde(default)]
    pub max_requests: Option<u32>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct CheckResponse {
    pub admitted: bool,
    pub status: Option<RateLimitStatus>,
}
