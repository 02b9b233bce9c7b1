pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod state;
pub mod worker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AppError, LimitError};
pub use rate_limit::{RateLimitConfig, RateLimitEntry, RateLimitStatus, RateLimitStore, namespaced};
pub use worker::spawn_sweeper;
