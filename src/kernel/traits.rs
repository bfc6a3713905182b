// Trait definitions for the counter store capability
//
// This is an INFRASTRUCTURE trait only - no ranking policy. Failover order
// and the "first non-empty tier wins" read policy live in the domain service
// that owns the store list.
//
// Naming convention: Base* for trait names (e.g., BaseKeywordStore)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::types::{RankedKeyword, TierLabel};

/// A storage tier that can count keywords and serve top-N rankings.
///
/// Three variants conform to this: the shared sorted-set cache, the
/// in-process volatile tallies, and the relational store. Each variant may
/// independently be unavailable; callers probe with `is_available` and fall
/// through to the next tier on failure.
#[async_trait]
pub trait BaseKeywordStore: Send + Sync {
    /// Which tier this store is - used as result provenance.
    fn tier(&self) -> TierLabel;

    /// Increase the count for `keyword` by 1 in global scope, and by 1 in
    /// the given location scope when present. Safe under unbounded
    /// concurrent callers: no increment may be lost to a race.
    async fn increment_count(&self, keyword: &str, location: Option<&str>) -> Result<()>;

    /// Up to `limit` (keyword, count) pairs, count descending. Tie order is
    /// variant-defined but stable across repeated calls on unchanged data.
    async fn top_keywords(&self, limit: usize) -> Result<Vec<RankedKeyword>>;

    /// Same as `top_keywords`, scoped to one location category.
    async fn top_keywords_by_location(
        &self,
        location: &str,
        limit: usize,
    ) -> Result<Vec<RankedKeyword>>;

    /// Global count for a keyword; 0 when never counted.
    async fn keyword_count(&self, keyword: &str) -> Result<i64>;

    /// Liveness probe. Must return quickly and never error - internal
    /// faults are converted to `false`.
    async fn is_available(&self) -> bool;
}
