//! ABOUTME: Connection pool statistics model and Prometheus collector
//! ABOUTME: Translates pool stat snapshots into labeled metric samples on scrape

pub mod collector;
pub mod provider;

pub use collector::StatsCollector;
pub use provider::{NamedStats, PoolStats, StatsGetter, StatsProvider};
