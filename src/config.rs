use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    /// How often the volatile tier is drained into the database, in seconds.
    pub backup_interval_secs: u64,
    /// Upper bound on the shared-cache liveness probe, in milliseconds.
    pub redis_probe_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            backup_interval_secs: env::var("KEYWORD_BACKUP_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("KEYWORD_BACKUP_INTERVAL_SECS must be a valid number")?,
            redis_probe_timeout_ms: env::var("REDIS_PROBE_TIMEOUT_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .context("REDIS_PROBE_TIMEOUT_MS must be a valid number")?,
        })
    }
}
