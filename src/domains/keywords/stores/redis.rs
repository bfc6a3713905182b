//! Fast-shared tier: Redis sorted sets shared across processes.
//!
//! Counts live in `keyword:ranking` (global) and `keyword:location:{name}`
//! (per location scope). Increments use ZINCRBY so concurrent writers from
//! any number of processes never interleave destructively.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::OnceCell;

use crate::common::types::{RankedKeyword, TierLabel};
use crate::domains::keywords::stores::memory::VolatileSnapshot;
use crate::kernel::traits::BaseKeywordStore;

const GLOBAL_RANKING_KEY: &str = "keyword:ranking";
const LOCATION_KEY_PREFIX: &str = "keyword:location:";

fn location_key(location: &str) -> String {
    format!("{}{}", LOCATION_KEY_PREFIX, location)
}

/// Redis-backed counter store.
///
/// The connection manager is created lazily on first use, so a cache that is
/// down when the process starts is picked up as soon as it probes healthy.
/// Once established, the manager reconnects on its own.
pub struct RedisKeywordStore {
    client: redis::Client,
    manager: OnceCell<ConnectionManager>,
    probe_timeout: Duration,
}

impl RedisKeywordStore {
    /// Parse the URL and prepare a lazy connection. Does not touch the
    /// network; the first operation does.
    pub fn connect(redis_url: &str, probe_timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .with_context(|| format!("Invalid Redis URL: {}", redis_url))?;
        Ok(Self {
            client,
            manager: OnceCell::new(),
            probe_timeout,
        })
    }

    async fn manager(&self) -> Result<ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
            .await
            .context("Failed to connect to Redis")?;
        Ok(manager.clone())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.manager().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn top_of_key(&self, key: &str, limit: usize) -> Result<Vec<RankedKeyword>> {
        if limit == 0 {
            // ZREVRANGE treats a stop of -1 as "to the end"
            return Ok(Vec::new());
        }
        let mut conn = self.manager().await?;
        let rows: Vec<(String, f64)> = conn
            .zrevrange_withscores(key, 0, limit as isize - 1)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(keyword, score)| RankedKeyword {
                keyword,
                count: score as i64,
            })
            .collect())
    }

    /// Push a drained volatile snapshot into the sorted sets.
    ///
    /// Additive (ZINCRBY, not ZADD): counts the cache accrued on its own
    /// since recovering must not be clobbered by the restore.
    pub async fn merge_snapshot(&self, snapshot: &VolatileSnapshot) -> Result<()> {
        let mut conn = self.manager().await?;

        for (keyword, count) in &snapshot.global {
            let _: f64 = conn.zincr(GLOBAL_RANKING_KEY, keyword, *count).await?;
        }
        for (location, tallies) in &snapshot.by_location {
            let key = location_key(location);
            for (keyword, count) in tallies {
                let _: f64 = conn.zincr(&key, keyword, *count).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BaseKeywordStore for RedisKeywordStore {
    fn tier(&self) -> TierLabel {
        TierLabel::SharedCache
    }

    async fn increment_count(&self, keyword: &str, location: Option<&str>) -> Result<()> {
        let mut conn = self.manager().await?;
        let _: f64 = conn.zincr(GLOBAL_RANKING_KEY, keyword, 1i64).await?;

        if let Some(location) = location {
            let _: f64 = conn.zincr(location_key(location), keyword, 1i64).await?;
        }
        Ok(())
    }

    async fn top_keywords(&self, limit: usize) -> Result<Vec<RankedKeyword>> {
        self.top_of_key(GLOBAL_RANKING_KEY, limit).await
    }

    async fn top_keywords_by_location(
        &self,
        location: &str,
        limit: usize,
    ) -> Result<Vec<RankedKeyword>> {
        self.top_of_key(&location_key(location), limit).await
    }

    async fn keyword_count(&self, keyword: &str) -> Result<i64> {
        let mut conn = self.manager().await?;
        let score: Option<f64> = conn.zscore(GLOBAL_RANKING_KEY, keyword).await?;
        Ok(score.map(|s| s as i64).unwrap_or(0))
    }

    /// PING under a bounded timeout; any fault reads as unavailable.
    async fn is_available(&self) -> bool {
        matches!(
            tokio::time::timeout(self.probe_timeout, self.ping()).await,
            Ok(Ok(()))
        )
    }
}
