use clap::Parser;
use std::time::Duration;

use crate::error::LimitError;
use crate::rate_limit::RateLimitConfig;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "rate-gate")]
#[command(about = "In-process fixed-window rate limiter served over HTTP")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Default max admitted requests per window for check requests
    #[arg(long, default_value_t = 10)]
    pub rate_limit: u32,

    // Default window length in milliseconds for check requests
    #[arg(long, default_value_t = 60_000)]
    pub rate_window_ms: u64,

    // Longest window a check request may ask for
    #[arg(long, default_value_t = 86_400_000)]
    pub max_window_ms: u64,

    // Max /api requests per client per guard window
    #[arg(long, default_value_t = 1000)]
    pub guard_limit: u32,

    // Guard window length in milliseconds
    #[arg(long, default_value_t = 60_000)]
    pub guard_window_ms: u64,

    // Key the guard on x-forwarded-for (only behind a proxy that sets it)
    #[arg(long, default_value_t = false)]
    pub trust_forwarded: bool,

    // Seconds between sweeps of expired entries
    #[arg(long, default_value_t = 60)]
    pub sweep_interval: u64,
}

impl Args {
    pub fn policy(&self) -> Result<RateLimitConfig, LimitError> {
        RateLimitConfig::new(self.rate_window_ms, self.rate_limit)
    }

    pub fn guard_policy(&self) -> Result<RateLimitConfig, LimitError> {
        RateLimitConfig::new(self.guard_window_ms, self.guard_limit)
    }

    pub fn sweep_every(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_valid_policies() {
        let args = Args::parse_from(["rate-gate"]);
        let policy = args.policy().unwrap();
        assert_eq!(policy.max_requests(), 10);
        assert_eq!(policy.window_ms(), 60_000);

        let guard = args.guard_policy().unwrap();
        assert_eq!(guard.max_requests(), 1000);
        assert_eq!(guard.window_ms(), 60_000);

        assert_eq!(args.max_window_ms, 86_400_000);
        assert!(!args.trust_forwarded);
        assert_eq!(args.sweep_every(), Duration::from_secs(60));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let args = Args::parse_from(["rate-gate", "--rate-limit", "0"]);
        assert_eq!(args.policy(), Err(LimitError::ZeroMaxRequests));

        let args = Args::parse_from(["rate-gate", "--guard-window-ms", "0"]);
        assert_eq!(args.guard_policy(), Err(LimitError::ZeroWindow));
    }

    #[test]
    fn trust_forwarded_is_opt_in() {
        let args = Args::parse_from(["rate-gate", "--trust-forwarded"]);
        assert!(args.trust_forwarded);
    }

    #[test]
    fn zero_sweep_interval_is_clamped() {
        let args = Args::parse_from(["rate-gate", "--sweep-interval", "0"]);
        assert_eq!(args.sweep_every(), Duration::from_secs(1));
    }
}
