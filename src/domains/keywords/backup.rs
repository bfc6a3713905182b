//! Reconciliation of the volatile tier into durable storage.
//!
//! A recurring task (see `kernel::scheduled_tasks`) drains the in-process
//! tallies into `keyword_counts` so nothing is silently lost to a process
//! restart. If the shared cache has recovered from an outage, the same
//! snapshot is pushed back into it so readers see continuity instead of a
//! reset to zero.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use crate::domains::keywords::models::{Keyword, KeywordCount, LocationCategory};
use crate::domains::keywords::stores::{MemoryKeywordStore, RedisKeywordStore};
use crate::kernel::traits::BaseKeywordStore;

/// Drains volatile keyword tallies into the database on demand.
///
/// The scheduler calls `run` on a fixed interval; tests call it directly.
/// This task is the only writer that moves data out of the volatile tier.
pub struct KeywordCountBackup {
    memory: Arc<MemoryKeywordStore>,
    shared: Arc<RedisKeywordStore>,
    pool: PgPool,
}

impl KeywordCountBackup {
    pub fn new(
        memory: Arc<MemoryKeywordStore>,
        shared: Arc<RedisKeywordStore>,
        pool: PgPool,
    ) -> Self {
        Self {
            memory,
            shared,
            pool,
        }
    }

    /// One backup pass: snapshot-and-clear the volatile tier, merge the
    /// snapshot additively into today's count rows, then restore the shared
    /// cache from the same snapshot if it is reachable again.
    ///
    /// Individual merge failures are logged and skipped rather than aborting
    /// the batch; those entries are the bounded-loss window for this pass.
    pub async fn run(&self) -> Result<()> {
        if self.memory.is_empty() {
            tracing::debug!("volatile tier empty, nothing to back up");
            return Ok(());
        }

        let snapshot = self.memory.snapshot_and_clear();
        tracing::info!(
            keywords = snapshot.global.len(),
            locations = snapshot.by_location.len(),
            "backing up volatile keyword counts"
        );

        let today = Utc::now().date_naive();

        self.merge_tallies(&snapshot.global, None, today).await;

        for (location, tallies) in &snapshot.by_location {
            match LocationCategory::find_or_create(location, &self.pool).await {
                Ok(category) => {
                    self.merge_tallies(tallies, Some(category.id), today).await;
                }
                Err(e) => {
                    tracing::error!(location = %location, "failed to resolve location category, skipping its tallies: {}", e);
                }
            }
        }

        // Restoration path: the snapshot only exists because the shared
        // cache was down when these increments arrived. If it is back,
        // push the counts in so its readers see continuity.
        if self.shared.is_available().await {
            match self.shared.merge_snapshot(&snapshot).await {
                Ok(()) => tracing::info!("restored volatile counts into the shared cache"),
                Err(e) => tracing::warn!("failed to restore shared cache from snapshot: {}", e),
            }
        }

        tracing::info!("keyword count backup complete");
        Ok(())
    }

    /// Merge one scope's tallies into the durable day bucket, entry by entry.
    async fn merge_tallies(
        &self,
        tallies: &HashMap<String, i64>,
        location_category_id: Option<i64>,
        count_date: NaiveDate,
    ) {
        for (keyword, count) in tallies {
            // The write path upserts the keyword row before it ever counts,
            // so a missing row is a logic inconsistency worth surfacing.
            let row = match Keyword::find_by_normalized(keyword, &self.pool).await {
                Ok(Some(row)) => row,
                Ok(None) => {
                    tracing::warn!(keyword = %keyword, "keyword missing from database, skipping backup entry");
                    continue;
                }
                Err(e) => {
                    tracing::error!(keyword = %keyword, "keyword lookup failed, skipping backup entry: {}", e);
                    continue;
                }
            };

            if let Err(e) =
                KeywordCount::merge(row.id, location_category_id, *count, count_date, &self.pool)
                    .await
            {
                tracing::error!(keyword = %keyword, "count merge failed, skipping backup entry: {}", e);
            }
        }
    }
}
