//! Ranking orchestrator: the stable public API the search pipeline consumes.
//!
//! Owns the priority-ordered store list (shared cache → volatile tallies →
//! database) and the failover policy over it. Neither public method has an
//! error channel - counting and ranking are best-effort relative to the
//! search request they ride on, and every internal fault is converted to a
//! log line.

use std::sync::Arc;

use sqlx::PgPool;

use crate::common::normalize::{normalize_keyword, normalize_location};
use crate::common::types::{PopularKeywords, TierLabel};
use crate::domains::keywords::models::Keyword;
use crate::kernel::traits::BaseKeywordStore;

/// Limit applied when the caller passes none (or a non-positive one).
pub const DEFAULT_POPULAR_KEYWORD_LIMIT: i64 = 10;
/// Hard ceiling on the limit, to bound response size.
pub const MAX_POPULAR_KEYWORD_LIMIT: i64 = 100;

pub struct KeywordRankingService {
    /// Failover order: shared cache, then volatile, with the durable store
    /// last. The durable entry is the terminal read fallback; on the write
    /// path it is narrowed to the keyword-row upsert.
    stores: Vec<Arc<dyn BaseKeywordStore>>,
    pool: PgPool,
}

impl KeywordRankingService {
    pub fn new(stores: Vec<Arc<dyn BaseKeywordStore>>, pool: PgPool) -> Self {
        Self { stores, pool }
    }

    /// Record one search for `keyword`, optionally scoped to a location.
    ///
    /// Never fails the caller: a blank keyword is a logged no-op, and a
    /// write that every cache tier refuses is logged and dropped.
    pub async fn record_search(&self, keyword: &str, location: Option<&str>) {
        let canonical = normalize_keyword(keyword);
        if canonical.is_empty() {
            tracing::debug!(raw = keyword, "ignoring blank keyword");
            return;
        }
        let location = location.map(normalize_location).filter(|l| !l.is_empty());

        // The one durable touch on the write path: make sure the keyword row
        // exists so the backup task can resolve it later. Failure here must
        // not stop the cache increment.
        if let Err(e) = Keyword::find_or_create(keyword, &canonical, &self.pool).await {
            tracing::warn!(keyword = %canonical, "failed to ensure keyword row: {}", e);
        }

        for store in self.stores.iter().filter(|s| s.tier() != TierLabel::Durable) {
            if !store.is_available().await {
                tracing::debug!(tier = %store.tier(), keyword = %canonical, "tier unavailable, failing over");
                continue;
            }
            match store.increment_count(&canonical, location.as_deref()).await {
                Ok(()) => {
                    tracing::debug!(tier = %store.tier(), keyword = %canonical, "recorded search keyword");
                    return;
                }
                Err(e) => {
                    tracing::warn!(tier = %store.tier(), keyword = %canonical, "increment failed, failing over: {}", e);
                }
            }
        }

        // Counting is advisory: this event is permanently lost
        tracing::error!(keyword = %canonical, "all cache tiers unavailable, search keyword dropped");
    }

    /// Most popular keywords for today, globally or for one location.
    ///
    /// First non-empty available tier wins, not first available: a reachable
    /// but cold-started cache should not mask a tier that actually has data.
    /// The durable store is the terminal fallback and always answers, even
    /// with an empty list.
    pub async fn popular_keywords(
        &self,
        location: Option<&str>,
        limit: Option<i64>,
    ) -> PopularKeywords {
        let limit = validated_limit(limit);
        let location = location.map(normalize_location).filter(|l| !l.is_empty());

        let Some((durable, caches)) = self.stores.split_last() else {
            return PopularKeywords::empty(TierLabel::Durable);
        };

        for store in caches {
            if !store.is_available().await {
                tracing::debug!(tier = %store.tier(), "tier unavailable for ranking query");
                continue;
            }
            let result = match location.as_deref() {
                Some(loc) => store.top_keywords_by_location(loc, limit).await,
                None => store.top_keywords(limit).await,
            };
            match result {
                Ok(keywords) if !keywords.is_empty() => {
                    return PopularKeywords {
                        keywords,
                        source: store.tier(),
                    };
                }
                Ok(_) => {
                    tracing::debug!(tier = %store.tier(), "tier empty, falling through");
                }
                Err(e) => {
                    tracing::warn!(tier = %store.tier(), "ranking query failed, falling through: {}", e);
                }
            }
        }

        let result = match location.as_deref() {
            Some(loc) => durable.top_keywords_by_location(loc, limit).await,
            None => durable.top_keywords(limit).await,
        };
        match result {
            Ok(keywords) => PopularKeywords {
                keywords,
                source: durable.tier(),
            },
            Err(e) => {
                tracing::error!("durable ranking query failed: {}", e);
                PopularKeywords::empty(durable.tier())
            }
        }
    }

    /// Tiers that currently probe as available, in failover order.
    pub async fn available_tiers(&self) -> Vec<TierLabel> {
        let mut tiers = Vec::new();
        for store in &self.stores {
            if store.is_available().await {
                tiers.push(store.tier());
            }
        }
        tiers
    }
}

fn validated_limit(limit: Option<i64>) -> usize {
    match limit {
        Some(n) if n > 0 => n.min(MAX_POPULAR_KEYWORD_LIMIT) as usize,
        _ => DEFAULT_POPULAR_KEYWORD_LIMIT as usize,
    }
}
