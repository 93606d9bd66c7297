//! ABOUTME: Shared testing utilities and helper functions
//! ABOUTME: Common test fixtures and mocks for all crates

use std::time::Duration;

use pw_stats::{PoolStats, StatsGetter};

/// A stats getter that always returns the same snapshot
#[derive(Debug, Clone)]
pub struct StaticStats {
    stats: PoolStats,
}

impl StaticStats {
    pub fn new(stats: PoolStats) -> Self {
        Self { stats }
    }
}

impl StatsGetter for StaticStats {
    fn stats(&self) -> PoolStats {
        self.stats
    }
}

/// A snapshot with every field set to a distinct, recognizable value
pub fn sample_stats() -> PoolStats {
    PoolStats {
        max_open: 10,
        open: 5,
        in_use: 2,
        idle: 3,
        wait_count: 7,
        wait_duration: Duration::from_millis(1500),
        max_idle_closed: 1,
        max_lifetime_closed: 4,
    }
}
