mod check;
mod health;
mod metrics;
mod status;

pub use check::check_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use status::status_handler;
