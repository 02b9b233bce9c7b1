use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::metrics::{STORE_ENTRIES, SWEPT_TOTAL};
use crate::rate_limit::RateLimitStore;

// Whole milliseconds, saturating at u64::MAX
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Spawn the background sweep that evicts expired windows every `every`.
///
/// The task stops when `shutdown` is cancelled; await the returned handle to know it is gone.
pub fn spawn_sweeper(
    store: Arc<RateLimitStore>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = millis(every), "Sweeper started");

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick fires immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.sweep();
                    SWEPT_TOTAL.inc_by(removed as f64);
                    STORE_ENTRIES.set(store.len() as f64);
                    if removed > 0 {
                        debug!(removed, remaining = store.len(), "Swept expired entries");
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Sweeper shutting down");
                    break;
                }
            }
        }
    })
}
