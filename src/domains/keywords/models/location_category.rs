use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A location scope that keyword counts can be bucketed under.
///
/// Names are stored in canonical (normalized) form; resolution from name to
/// id is an idempotent upsert, not a hardcoded mapping.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LocationCategory {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl LocationCategory {
    /// Find or create a location category by canonical name
    pub async fn find_or_create(name: &str, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, LocationCategory>(
            r#"
            INSERT INTO location_categories (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING *
            "#,
        )
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Find a location category by canonical name
    pub async fn find_by_name(name: &str, pool: &PgPool) -> Result<Option<Self>> {
        let category =
            sqlx::query_as::<_, LocationCategory>("SELECT * FROM location_categories WHERE name = $1")
                .bind(name)
                .fetch_optional(pool)
                .await?;
        Ok(category)
    }
}
