//! ABOUTME: Shared lifetime counters for an instrumented pool
//! ABOUTME: Atomics so pool handle clones and sqlx hooks see the same totals

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Monotonic totals accumulated over a pool's lifetime.
///
/// All counters use relaxed ordering; readers take snapshots, they do not
/// synchronize with writers.
#[derive(Debug, Default)]
pub struct PoolCounters {
    wait_count: AtomicU64,
    wait_nanos: AtomicU64,
    max_idle_closed: AtomicU64,
    max_lifetime_closed: AtomicU64,
}

impl PoolCounters {
    /// Record one acquire that had to wait, and for how long
    pub fn record_wait(&self, elapsed: Duration) {
        self.wait_count.fetch_add(1, Ordering::Relaxed);
        self.wait_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record a connection closed for exceeding the idle limit
    pub fn record_idle_closed(&self) {
        self.max_idle_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection closed for exceeding the lifetime limit
    pub fn record_lifetime_closed(&self) {
        self.max_lifetime_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn wait_count(&self) -> u64 {
        self.wait_count.load(Ordering::Relaxed)
    }

    pub fn wait_duration(&self) -> Duration {
        Duration::from_nanos(self.wait_nanos.load(Ordering::Relaxed))
    }

    pub fn idle_closed(&self) -> u64 {
        self.max_idle_closed.load(Ordering::Relaxed)
    }

    pub fn lifetime_closed(&self) -> u64 {
        self.max_lifetime_closed.load(Ordering::Relaxed)
    }
}
