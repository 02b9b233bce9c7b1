//! Fixed-window admission control keyed by caller-chosen identifiers.
//!
//! Each identifier owns at most one [`RateLimitEntry`]. The window opens on the first
//! admitted call and stays fixed until `reset_at`; bursts at window boundaries are
//! accepted. Expired entries behave exactly like absent ones and are physically removed
//! by [`RateLimitStore::sweep`].

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::error::LimitError;
use crate::metrics::{ADMITTED_TOTAL, REJECTED_TOTAL};

/// Per call-site limit: at most `max_requests` admissions per `window_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    window_ms: u64,
    max_requests: u32,
}

impl RateLimitConfig {
    pub fn new(window_ms: u64, max_requests: u32) -> Result<Self, LimitError> {
        if window_ms == 0 {
            return Err(LimitError::ZeroWindow);
        }
        if max_requests == 0 {
            return Err(LimitError::ZeroMaxRequests);
        }
        Ok(Self {
            window_ms,
            max_requests,
        })
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }
}

// Rate limit entry - tracks admissions per identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: i64, // ms since epoch
    pub limit: u32,    // max_requests of the last admitted call
}

impl RateLimitEntry {
    fn open(now: i64, config: &RateLimitConfig) -> Self {
        let window = i64::try_from(config.window_ms).unwrap_or(i64::MAX);
        Self {
            count: 1,
            reset_at: now.saturating_add(window),
            limit: config.max_requests,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.reset_at < now
    }
}

/// Snapshot of a live window, as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub remaining: u32,
    pub reset_at: i64,
    pub total: u32,
}

/// Prefix `identifier` with a caller namespace so call sites sharing a store don't collide.
pub fn namespaced(namespace: &str, identifier: &str) -> String {
    format!("{}:{}", namespace, identifier)
}

/// Process-local store of rate limit windows.
///
/// Each `check_limit` runs its read-modify-write under the map shard lock that owns the
/// identifier, so concurrent callers always observe a consistent `count`.
pub struct RateLimitStore {
    entries: DashMap<String, RateLimitEntry>,
    clock: Arc<dyn Clock>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Returns `true` if `identifier` may proceed under `config`, counting the admission.
    /// A rejected call leaves the entry untouched.
    pub fn check_limit(&self, identifier: &str, config: &RateLimitConfig) -> bool {
        let now = self.clock.now_ms();

        let admitted = match self.entries.entry(identifier.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(RateLimitEntry::open(now, config));
                true
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if entry.is_expired(now) {
                    // new window replaces the old one
                    *entry = RateLimitEntry::open(now, config);
                    true
                } else if entry.count < config.max_requests {
                    entry.count += 1;
                    entry.limit = config.max_requests;
                    true
                } else {
                    false
                }
            }
        };

        if admitted {
            ADMITTED_TOTAL.inc();
            trace!(identifier, "admitted");
        } else {
            REJECTED_TOTAL.inc();
            debug!(identifier, max_requests = config.max_requests, "rate limit exceeded");
        }
        admitted
    }

    /// Status of the live window for `identifier`, or `None` if absent or expired.
    pub fn get_status(&self, identifier: &str) -> Option<RateLimitStatus> {
        let now = self.clock.now_ms();
        let entry = self.entries.get(identifier)?;
        if entry.is_expired(now) {
            return None;
        }
        Some(RateLimitStatus {
            remaining: entry.limit.saturating_sub(entry.count),
            reset_at: entry.reset_at,
            total: entry.limit,
        })
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_ms();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    // Drop all state; the store can be reused afterwards
    pub fn dispose(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}
