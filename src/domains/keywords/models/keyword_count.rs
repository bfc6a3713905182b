use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::types::RankedKeyword;

/// One day's count for a (keyword, location scope) pair.
///
/// `location_category_id` null means global scope. At most one row exists
/// per (keyword, location scope, date); the unique index treats nulls as
/// equal so the global row is unique too. Rows are only ever mutated by
/// additive merge, which keeps counts monotone across concurrent backup
/// runs.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct KeywordCount {
    pub id: i64,
    pub keyword_id: i64,
    pub location_category_id: Option<i64>,
    pub count: i64,
    pub count_date: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

impl KeywordCount {
    /// Additively merge `delta` into the count row for the given scope and
    /// date, creating the row if it does not exist.
    ///
    /// A single insert-or-update statement with `count = count + delta`, so
    /// concurrent merges never lose increments to read-modify-write races.
    pub async fn merge(
        keyword_id: i64,
        location_category_id: Option<i64>,
        delta: i64,
        count_date: NaiveDate,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, KeywordCount>(
            r#"
            INSERT INTO keyword_counts (keyword_id, location_category_id, count, count_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (keyword_id, location_category_id, count_date) DO UPDATE
            SET count = keyword_counts.count + EXCLUDED.count, updated_at = now()
            RETURNING *
            "#,
        )
        .bind(keyword_id)
        .bind(location_category_id)
        .bind(delta)
        .bind(count_date)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Find the count row for one (keyword, location scope, date) tuple
    pub async fn find_by_scope(
        keyword_id: i64,
        location_category_id: Option<i64>,
        count_date: NaiveDate,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, KeywordCount>(
            r#"
            SELECT * FROM keyword_counts
            WHERE keyword_id = $1
              AND location_category_id IS NOT DISTINCT FROM $2
              AND count_date = $3
            "#,
        )
        .bind(keyword_id)
        .bind(location_category_id)
        .bind(count_date)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Top N keywords for a date and location scope, count descending.
    ///
    /// One join query hydrates the keyword text alongside the counts.
    /// Ties break on canonical keyword text ascending, so repeated queries
    /// against unchanged data return the same order.
    pub async fn find_top_for_date(
        location_category_id: Option<i64>,
        count_date: NaiveDate,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<RankedKeyword>> {
        sqlx::query_as::<_, RankedKeyword>(
            r#"
            SELECT k.normalized_keyword AS keyword, kc.count
            FROM keyword_counts kc
            INNER JOIN keywords k ON k.id = kc.keyword_id
            WHERE kc.count_date = $1
              AND kc.location_category_id IS NOT DISTINCT FROM $2
            ORDER BY kc.count DESC, k.normalized_keyword
            LIMIT $3
            "#,
        )
        .bind(count_date)
        .bind(location_category_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
