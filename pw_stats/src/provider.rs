//! ABOUTME: Pool statistics snapshot and the capabilities that yield one
//! ABOUTME: StatsGetter reads counters, StatsProvider also knows the database name

use std::sync::Arc;
use std::time::Duration;

/// One snapshot of a connection pool's runtime counters.
///
/// Gauge-like fields (`max_open`, `open`, `in_use`, `idle`) describe the pool
/// at the instant of the snapshot; the remaining fields are totals that only
/// ever grow over the pool's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Configured ceiling of open connections
    pub max_open: u64,
    /// Established connections, in use plus idle
    pub open: u64,
    /// Connections currently checked out
    pub in_use: u64,
    /// Idle connections waiting in the pool
    pub idle: u64,
    /// Total number of acquires that had to wait
    pub wait_count: u64,
    /// Total time spent blocked waiting for a connection
    pub wait_duration: Duration,
    /// Total connections closed for sitting idle past the idle limit
    pub max_idle_closed: u64,
    /// Total connections closed for outliving the lifetime limit
    pub max_lifetime_closed: u64,
}

/// Capability to take a [`PoolStats`] snapshot.
///
/// Implemented by pool handles; snapshots are cheap and infallible.
pub trait StatsGetter {
    fn stats(&self) -> PoolStats;
}

/// A [`StatsGetter`] that also knows which database it describes, so the
/// metrics side does not need to be told the name out of band.
pub trait StatsProvider: StatsGetter {
    fn db_name(&self) -> &str;
}

impl<G: StatsGetter> StatsGetter for Arc<G> {
    fn stats(&self) -> PoolStats {
        <G as StatsGetter>::stats(self)
    }
}

impl<P: StatsProvider> StatsProvider for Arc<P> {
    fn db_name(&self) -> &str {
        <P as StatsProvider>::db_name(self)
    }
}

/// Pairs any [`StatsGetter`] with a configured database name
#[derive(Debug, Clone)]
pub struct NamedStats<G> {
    db_name: String,
    getter: G,
}

impl<G> NamedStats<G> {
    pub fn new(db_name: impl Into<String>, getter: G) -> Self {
        Self {
            db_name: db_name.into(),
            getter,
        }
    }
}

impl<G: StatsGetter> StatsGetter for NamedStats<G> {
    fn stats(&self) -> PoolStats {
        self.getter.stats()
    }
}

impl<G: StatsGetter> StatsProvider for NamedStats<G> {
    fn db_name(&self) -> &str {
        &self.db_name
    }
}
