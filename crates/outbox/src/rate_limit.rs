//! Per-tenant broadcast rate limiting.
//!
//! The default implementation is an in-memory sliding window keyed by
//! (organization, unix minute). It is best-effort and process-local: a
//! multi-instance deployment needs a shared counter behind the same
//! [`RateLimiter`] trait for strict enforcement. Known limitation, not
//! a bug.

use std::collections::HashMap;
use std::sync::Mutex;

use relay_core::types::OrgId;

/// Default ceiling: events broadcast per tenant per minute.
pub const DEFAULT_EVENTS_PER_MINUTE: u32 = 1000;

/// Bounds broadcast throughput per tenant.
///
/// The processor checks [`allow`](Self::allow) before pulling another
/// batch and calls [`record`](Self::record) with the number of events
/// it actually broadcast. A denied tenant is deferred to the next
/// invocation, never failed.
pub trait RateLimiter: Send + Sync {
    /// Whether the tenant may broadcast more events this minute.
    fn allow(&self, organization_id: OrgId) -> bool;

    /// Count `count` broadcast events against the tenant's window.
    fn record(&self, organization_id: OrgId, count: u32);
}

/// Process-local sliding-window limiter.
pub struct InMemoryRateLimiter {
    events_per_minute: u32,
    windows: Mutex<HashMap<(OrgId, i64), u32>>,
}

impl InMemoryRateLimiter {
    pub fn new(events_per_minute: u32) -> Self {
        Self {
            events_per_minute,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Build a limiter with the ceiling from `OUTBOX_EVENTS_PER_MINUTE`.
    pub fn from_env() -> Self {
        let events_per_minute = std::env::var("OUTBOX_EVENTS_PER_MINUTE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_EVENTS_PER_MINUTE);
        Self::new(events_per_minute)
    }

    /// Current unix-minute bucket.
    fn current_minute() -> i64 {
        chrono::Utc::now().timestamp() / 60
    }

    fn allow_at(&self, organization_id: OrgId, minute: i64) -> bool {
        let windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let used = windows.get(&(organization_id, minute)).copied().unwrap_or(0);
        used < self.events_per_minute
    }

    fn record_at(&self, organization_id: OrgId, minute: i64, count: u32) {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        // Drop buckets from past minutes while we hold the lock; state
        // resets naturally when the minute rolls over.
        windows.retain(|(_, bucket), _| *bucket >= minute);
        *windows.entry((organization_id, minute)).or_insert(0) += count;
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_EVENTS_PER_MINUTE)
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn allow(&self, organization_id: OrgId) -> bool {
        self.allow_at(organization_id, Self::current_minute())
    }

    fn record(&self, organization_id: OrgId, count: u32) {
        self.record_at(organization_id, Self::current_minute(), count);
    }
}
