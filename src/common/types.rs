//! Result types shared between the counter stores and the ranking service.

use serde::{Deserialize, Serialize};

/// Which storage tier produced a ranking result.
///
/// Provenance only - callers use it for observability, not for correctness.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TierLabel {
    SharedCache,
    VolatileCache,
    Durable,
}

impl std::fmt::Display for TierLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TierLabel::SharedCache => write!(f, "shared-cache"),
            TierLabel::VolatileCache => write!(f, "volatile-cache"),
            TierLabel::Durable => write!(f, "durable"),
        }
    }
}

/// A single (keyword, count) pair in a ranking result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct RankedKeyword {
    pub keyword: String,
    pub count: i64,
}

/// Ranking query result: up to `limit` keywords ordered by count descending,
/// tagged with the tier that served them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularKeywords {
    pub keywords: Vec<RankedKeyword>,
    pub source: TierLabel,
}

impl PopularKeywords {
    pub fn empty(source: TierLabel) -> Self {
        Self {
            keywords: Vec::new(),
            source,
        }
    }
}
