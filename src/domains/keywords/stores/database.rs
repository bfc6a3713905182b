//! Durable tier: relational storage with daily count buckets.
//!
//! Treated as structurally available - if Postgres is gone the process has
//! bigger problems than keyword counting, so `is_available` does not probe.
//! Increments and merges are single atomic insert-or-update statements.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::common::types::{RankedKeyword, TierLabel};
use crate::domains::keywords::models::{Keyword, KeywordCount, LocationCategory};
use crate::kernel::traits::BaseKeywordStore;

pub struct DatabaseKeywordStore {
    pool: PgPool,
}

impl DatabaseKeywordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseKeywordStore for DatabaseKeywordStore {
    fn tier(&self) -> TierLabel {
        TierLabel::Durable
    }

    async fn increment_count(&self, keyword: &str, location: Option<&str>) -> Result<()> {
        let today = Utc::now().date_naive();
        let row = Keyword::find_or_create(keyword, keyword, &self.pool).await?;
        KeywordCount::merge(row.id, None, 1, today, &self.pool).await?;

        if let Some(location) = location {
            let category = LocationCategory::find_or_create(location, &self.pool).await?;
            KeywordCount::merge(row.id, Some(category.id), 1, today, &self.pool).await?;
        }
        Ok(())
    }

    async fn top_keywords(&self, limit: usize) -> Result<Vec<RankedKeyword>> {
        let today = Utc::now().date_naive();
        KeywordCount::find_top_for_date(None, today, limit as i64, &self.pool).await
    }

    async fn top_keywords_by_location(
        &self,
        location: &str,
        limit: usize,
    ) -> Result<Vec<RankedKeyword>> {
        let today = Utc::now().date_naive();
        let Some(category) = LocationCategory::find_by_name(location, &self.pool).await? else {
            return Ok(Vec::new());
        };
        KeywordCount::find_top_for_date(Some(category.id), today, limit as i64, &self.pool).await
    }

    async fn keyword_count(&self, keyword: &str) -> Result<i64> {
        let today = Utc::now().date_naive();
        let Some(row) = Keyword::find_by_normalized(keyword, &self.pool).await? else {
            return Ok(0);
        };
        let count = KeywordCount::find_by_scope(row.id, None, today, &self.pool)
            .await?
            .map(|entry| entry.count)
            .unwrap_or(0);
        Ok(count)
    }

    async fn is_available(&self) -> bool {
        true
    }
}
