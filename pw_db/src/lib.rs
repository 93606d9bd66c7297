//! ABOUTME: Instrumented SQLite connection pool
//! ABOUTME: Wraps sqlx with wait and closed-connection accounting for stats snapshots

mod counters;
mod pool;

pub use counters::PoolCounters;
pub use pool::{InstrumentedPool, PoolLimits};
