//! ABOUTME: Configuration management with validation and environment loading
//! ABOUTME: Handles exporter settings from defaults, optional file, and env vars

use config::{Config as ConfigBuilder, Environment, File};
use pw_core::{Error, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Main configuration struct
#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub database: DatabaseConfig,
}

/// Observability server configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub obs_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            obs_port: 9000,
        }
    }
}

/// Database and pool configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DatabaseConfig {
    /// Value of the db_name label on every exported sample
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub path: String,
    #[validate(range(min = 1, max = 100))]
    pub max_connections: u32,
    #[validate(range(max = 100))]
    pub min_connections: u32,
    #[validate(range(min = 1, max = 300))]
    pub acquire_timeout_seconds: u64,
    /// Close connections idle longer than this; unset disables the limit
    pub idle_timeout_seconds: Option<u64>,
    /// Close connections older than this; unset disables the limit
    pub max_lifetime_seconds: Option<u64>,
    /// How often the exporter pings the pool to keep its numbers honest
    #[validate(range(min = 1, max = 3600))]
    pub ping_interval_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: "main".to_string(),
            path: "poolwatch.db".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 10,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
            ping_interval_seconds: 15,
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional poolwatch.toml, and
    /// POOLWATCH_-prefixed environment variables
    pub fn load() -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        // Set defaults first
        builder = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.obs_port", 9000)?
            .set_default("database.name", "main")?
            .set_default("database.path", "poolwatch.db")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.acquire_timeout_seconds", 10)?
            .set_default("database.idle_timeout_seconds", 600)?
            .set_default("database.max_lifetime_seconds", 1800)?
            .set_default("database.ping_interval_seconds", 15)?;

        // Handle nested environment variables whose keys contain underscores;
        // these don't round-trip through the standard separator
        if let Ok(obs_port) = std::env::var("POOLWATCH_SERVER_OBS_PORT") {
            builder = builder.set_override("server.obs_port", obs_port)?;
        }
        if let Ok(max_connections) = std::env::var("POOLWATCH_DATABASE_MAX_CONNECTIONS") {
            builder = builder.set_override("database.max_connections", max_connections)?;
        }
        if let Ok(min_connections) = std::env::var("POOLWATCH_DATABASE_MIN_CONNECTIONS") {
            builder = builder.set_override("database.min_connections", min_connections)?;
        }
        if let Ok(interval) = std::env::var("POOLWATCH_DATABASE_PING_INTERVAL_SECONDS") {
            builder = builder.set_override("database.ping_interval_seconds", interval)?;
        }

        // Try to load from poolwatch.toml if it exists (optional)
        if std::path::Path::new("poolwatch.toml").exists() {
            builder = builder.add_source(File::with_name("poolwatch").required(false));
        }

        // Load from environment variables with POOLWATCH_ prefix (highest priority)
        builder = builder.add_source(
            Environment::with_prefix("POOLWATCH")
                .try_parsing(true)
                .separator("_"),
        );

        let config = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build config: {}", e)))?;

        let parsed: Config = config
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to deserialize config: {}", e)))?;

        // Validate the configuration
        parsed
            .validate()
            .map_err(|e| Error::Validation(format!("Config validation failed: {}", e)))?;

        Ok(parsed)
    }
}
