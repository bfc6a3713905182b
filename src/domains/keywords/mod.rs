//! Keyword popularity domain: counter store tiers, the ranking service that
//! fails over between them, and the backup task that reconciles the volatile
//! tier into the database.

pub mod backup;
pub mod models;
pub mod service;
pub mod stores;

pub use backup::KeywordCountBackup;
pub use service::KeywordRankingService;
pub use stores::{DatabaseKeywordStore, MemoryKeywordStore, RedisKeywordStore};

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tokio_cron_scheduler::JobScheduler;

use crate::config::Config;
use crate::kernel::scheduled_tasks::start_scheduler;

/// Fully wired keyword ranking subsystem.
///
/// Owns the three store tiers, the ranking service over them, and the backup
/// task. `start_backup_scheduler` is separate from construction so embedders
/// (and tests) can drive the backup by hand instead.
pub struct KeywordRankingRuntime {
    pub service: KeywordRankingService,
    pub backup: Arc<KeywordCountBackup>,
    pub shared: Arc<RedisKeywordStore>,
    pub volatile: Arc<MemoryKeywordStore>,
    pub durable: Arc<DatabaseKeywordStore>,
    pub pool: PgPool,
    backup_interval: Duration,
}

impl KeywordRankingRuntime {
    /// Connect the database pool and wire up all tiers from configuration.
    pub async fn connect(config: &Config) -> Result<Self> {
        let pool = PgPool::connect(&config.database_url)
            .await
            .context("Failed to connect to Postgres")?;
        Self::from_pool(pool, config)
    }

    /// Wire up all tiers over an existing pool.
    pub fn from_pool(pool: PgPool, config: &Config) -> Result<Self> {
        let shared = Arc::new(RedisKeywordStore::connect(
            &config.redis_url,
            Duration::from_millis(config.redis_probe_timeout_ms),
        )?);
        let volatile = Arc::new(MemoryKeywordStore::new());
        let durable = Arc::new(DatabaseKeywordStore::new(pool.clone()));

        let stores: Vec<Arc<dyn crate::kernel::traits::BaseKeywordStore>> =
            vec![shared.clone(), volatile.clone(), durable.clone()];
        let service = KeywordRankingService::new(stores, pool.clone());
        let backup = Arc::new(KeywordCountBackup::new(
            volatile.clone(),
            shared.clone(),
            pool.clone(),
        ));

        Ok(Self {
            service,
            backup,
            shared,
            volatile,
            durable,
            pool,
            backup_interval: Duration::from_secs(config.backup_interval_secs),
        })
    }

    /// Start the recurring backup task on the configured interval.
    pub async fn start_backup_scheduler(&self) -> Result<JobScheduler> {
        start_scheduler(self.backup.clone(), self.backup_interval).await
    }
}
