use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A search keyword known to the system.
///
/// Identity is the canonical (normalized) text; the raw text is kept as it
/// was first seen. Rows are created lazily the first time a keyword is
/// counted and are never deleted by this crate.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Keyword {
    pub id: i64,
    pub keyword: String,            // raw text as first seen
    pub normalized_keyword: String, // canonical text, unique
    pub created_at: DateTime<Utc>,
}

impl Keyword {
    /// Find or create a keyword row by canonical text.
    ///
    /// Idempotent: concurrent callers for the same canonical text converge
    /// on one row, and the raw text of the first writer wins.
    pub async fn find_or_create(raw: &str, normalized: &str, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Keyword>(
            r#"
            INSERT INTO keywords (keyword, normalized_keyword)
            VALUES ($1, $2)
            ON CONFLICT (normalized_keyword) DO UPDATE
            SET normalized_keyword = EXCLUDED.normalized_keyword
            RETURNING *
            "#,
        )
        .bind(raw)
        .bind(normalized)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Find a keyword row by canonical text
    pub async fn find_by_normalized(normalized: &str, pool: &PgPool) -> Result<Option<Self>> {
        let keyword =
            sqlx::query_as::<_, Keyword>("SELECT * FROM keywords WHERE normalized_keyword = $1")
                .bind(normalized)
                .fetch_optional(pool)
                .await?;
        Ok(keyword)
    }

    /// Count keyword rows
    pub async fn count(pool: &PgPool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM keywords")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
