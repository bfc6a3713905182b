//! Test harness with testcontainers for integration testing.
//!
//! Uses shared containers across all tests for dramatically improved
//! performance: Postgres and Redis start once per test binary. Each test
//! gets its own freshly-migrated database and its own Redis logical DB, so
//! rankings from one test never bleed into another's.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::redis::Redis;
use tokio::sync::OnceCell;

use keyword_ranking::config::Config;
use keyword_ranking::domains::keywords::KeywordRankingRuntime;

/// Shared test infrastructure that persists across all tests in a binary.
struct SharedTestInfra {
    pg_base_url: String,
    redis_base_url: String,
    // Keep containers alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
    _redis: ContainerAsync<Redis>,
}

/// Global shared infrastructure - initialized once, reused by all tests.
static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

/// Monotonic id for per-test databases and Redis logical DBs.
static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Initialize tracing subscriber to respect RUST_LOG environment variable.
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let pg_base_url = format!("postgresql://postgres:postgres@{}:{}", pg_host, pg_port);

        let redis = Redis::default()
            .start()
            .await
            .context("Failed to start Redis container")?;

        let redis_host = redis.get_host().await?;
        let redis_port = redis.get_host_port_ipv4(6379).await?;
        let redis_base_url = format!("redis://{}:{}", redis_host, redis_port);

        Ok(Self {
            pg_base_url,
            redis_base_url,
            _postgres: postgres,
            _redis: redis,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Per-test context: an isolated, migrated database plus an isolated Redis
/// logical DB on the shared containers.
pub struct TestHarness {
    pub db_pool: PgPool,
    pub redis_url: String,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        // Database pool is automatically dropped
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;
        let test_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);

        // Fresh database per test, migrated from scratch
        let db_name = format!("keyword_test_{}", test_id);
        let admin_pool = PgPool::connect(&format!("{}/postgres", infra.pg_base_url))
            .await
            .context("Failed to connect to admin database")?;
        sqlx::query(&format!("CREATE DATABASE {}", db_name))
            .execute(&admin_pool)
            .await
            .context("Failed to create test database")?;

        let db_pool = PgPool::connect(&format!("{}/{}", infra.pg_base_url, db_name))
            .await
            .context("Failed to connect to test database")?;
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run migrations")?;

        // Redis logical DBs 0-15; tests per binary stay below that
        let redis_url = format!("{}/{}", infra.redis_base_url, test_id % 16);

        Ok(Self { db_pool, redis_url })
    }

    fn config(&self, redis_url: &str) -> Config {
        Config {
            database_url: String::new(), // runtime is wired from the existing pool
            redis_url: redis_url.to_string(),
            backup_interval_secs: 300,
            redis_probe_timeout_ms: 500,
        }
    }

    /// Full stack: live shared cache, volatile tallies, durable store.
    pub fn runtime(&self) -> KeywordRankingRuntime {
        KeywordRankingRuntime::from_pool(self.db_pool.clone(), &self.config(&self.redis_url))
            .expect("Failed to wire ranking runtime")
    }

    /// Stack whose shared-cache tier points at a dead endpoint, forcing
    /// failover to the volatile tier.
    pub fn runtime_without_shared(&self) -> KeywordRankingRuntime {
        let mut config = self.config("redis://127.0.0.1:1");
        config.redis_probe_timeout_ms = 200;
        KeywordRankingRuntime::from_pool(self.db_pool.clone(), &config)
            .expect("Failed to wire ranking runtime")
    }
}
