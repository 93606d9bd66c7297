//! ABOUTME: Main binary for the poolwatch exporter
//! ABOUTME: Wires the instrumented pool to the metrics scrape endpoint

use std::process;
use std::time::Duration;

use pw_config::Config;
use pw_core::telemetry;
use pw_db::{InstrumentedPool, PoolLimits};
use pw_obs::ObsState;
use pw_stats::NamedStats;

fn pool_limits(config: &Config) -> PoolLimits {
    PoolLimits {
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        acquire_timeout: Duration::from_secs(config.database.acquire_timeout_seconds),
        idle_timeout: config.database.idle_timeout_seconds.map(Duration::from_secs),
        max_lifetime: config.database.max_lifetime_seconds.map(Duration::from_secs),
    }
}

#[tokio::main]
async fn main() {
    telemetry::init_tracing("development", "poolwatch");
    tracing::info!("poolwatch starting");

    // Load configuration - exit with non-zero if invalid
    let config = match Config::load() {
        Ok(config) => {
            tracing::debug!(?config, "Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    tracing::info!(
        host = %config.server.host,
        obs_port = %config.server.obs_port,
        db_name = %config.database.name,
        db_path = %config.database.path,
        "Application configured and ready"
    );

    // Open the instrumented connection pool
    let pool = match InstrumentedPool::open(&config.database.path, pool_limits(&config)).await {
        Ok(pool) => {
            tracing::info!("Connection pool opened");
            pool
        }
        Err(e) => {
            tracing::error!("Failed to open connection pool: {}", e);
            process::exit(1);
        }
    };

    // Verify database health
    if let Err(e) = pool.ping().await {
        tracing::error!("Database health check failed: {}", e);
        process::exit(1);
    }

    // Initialize observability state and attach the pool's collector
    let obs_state = ObsState::new();
    if let Err(e) = obs_state
        .metrics
        .register_pool(NamedStats::new(config.database.name.clone(), pool.clone()))
    {
        tracing::error!("Failed to register pool collector: {}", e);
        process::exit(1);
    }

    // Keep the pool lightly exercised so the exported numbers move
    let ping_pool = pool.clone();
    let ping_interval = Duration::from_secs(config.database.ping_interval_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ping_interval);
        loop {
            interval.tick().await;
            if let Err(e) = ping_pool.ping().await {
                tracing::warn!("Periodic health ping failed: {}", e);
            }
        }
    });

    // Start observability server
    let obs_bind_addr = format!("{}:{}", config.server.host, config.server.obs_port);
    if let Err(e) = pw_obs::start_server(&obs_bind_addr, obs_state).await {
        tracing::error!("Server error: {}", e);
        process::exit(1);
    }
}
