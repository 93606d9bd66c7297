//! ABOUTME: Scrape-time Prometheus collector for pool statistics
//! ABOUTME: Emits eight labeled samples from one snapshot per scrape

use prometheus_client::{
    collector::Collector,
    encoding::{DescriptorEncoder, EncodeLabelSet, EncodeMetric},
    metrics::{counter::ConstCounter, gauge::ConstGauge},
};

use crate::provider::{NamedStats, StatsGetter, StatsProvider};

const NAMESPACE: &str = "sql_pool";
const SUBSYSTEM: &str = "connections";

/// Label set attached to every sample
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct DbLabels {
    db_name: String,
}

/// Collector that republishes a pool's statistics on each scrape.
///
/// The collector holds no mutable state; it takes exactly one
/// [`PoolStats`](crate::PoolStats) snapshot per scrape and encodes all eight
/// samples from it, labeled with the provider's database name. Several
/// collectors for different databases can live in the same registry because
/// samples are label-scoped rather than registered globally.
#[derive(Debug)]
pub struct StatsCollector<P> {
    provider: P,
}

impl<P: StatsProvider> StatsCollector<P> {
    /// Create a collector from a provider that knows its own database name
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<G: StatsGetter> StatsCollector<NamedStats<G>> {
    /// Create a collector from a bare getter and an explicit database name
    pub fn named(db_name: impl Into<String>, getter: G) -> Self {
        Self {
            provider: NamedStats::new(db_name, getter),
        }
    }
}

fn fq_name(name: &str) -> String {
    format!("{}_{}_{}", NAMESPACE, SUBSYSTEM, name)
}

impl<P> Collector for StatsCollector<P>
where
    P: StatsProvider + std::fmt::Debug + Send + Sync + 'static,
{
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
        let stats = self.provider.stats();
        let labels = DbLabels {
            db_name: self.provider.db_name().to_string(),
        };

        let gauges = [
            (
                "max_open",
                "Maximum number of open connections to the database",
                stats.max_open as i64,
            ),
            (
                "open",
                "The number of established connections both in use and idle",
                stats.open as i64,
            ),
            (
                "in_use",
                "The number of connections currently in use",
                stats.in_use as i64,
            ),
            ("idle", "The number of idle connections", stats.idle as i64),
        ];

        for (name, help, value) in gauges {
            let gauge = ConstGauge::new(value);
            let metric_name = fq_name(name);
            let mut family_encoder =
                encoder.encode_descriptor(&metric_name, help, None, gauge.metric_type())?;
            let metric_encoder = family_encoder.encode_family(&labels)?;
            gauge.encode(metric_encoder)?;
        }

        let counters = [
            (
                "waited_for",
                "The total number of connections waited for",
                stats.wait_count,
            ),
            (
                "closed_max_idle",
                "The total number of connections closed due to the idle connection limit",
                stats.max_idle_closed,
            ),
            (
                "closed_max_lifetime",
                "The total number of connections closed due to the connection lifetime limit",
                stats.max_lifetime_closed,
            ),
        ];

        for (name, help, value) in counters {
            let counter = ConstCounter::new(value);
            let metric_name = fq_name(name);
            let mut family_encoder =
                encoder.encode_descriptor(&metric_name, help, None, counter.metric_type())?;
            let metric_encoder = family_encoder.encode_family(&labels)?;
            counter.encode(metric_encoder)?;
        }

        let blocked_seconds = ConstCounter::new(stats.wait_duration.as_secs_f64());
        let blocked_seconds_name = fq_name("blocked_seconds");
        let mut family_encoder = encoder.encode_descriptor(
            &blocked_seconds_name,
            "The total time blocked waiting for a new connection",
            None,
            blocked_seconds.metric_type(),
        )?;
        let metric_encoder = family_encoder.encode_family(&labels)?;
        blocked_seconds.encode(metric_encoder)?;

        Ok(())
    }
}
