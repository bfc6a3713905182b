//! Fast-volatile tier: in-process keyword tallies.
//!
//! Always available while the process lives; data is lost on restart, which
//! is the accepted risk of this tier. The backup task drains it into the
//! database on a schedule.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use async_trait::async_trait;

use crate::common::types::{RankedKeyword, TierLabel};
use crate::kernel::traits::BaseKeywordStore;

/// The full contents of the volatile tier at one instant.
///
/// Doubles as the live tally storage and the drained snapshot handed to the
/// backup task, since `snapshot_and_clear` is a `mem::take`.
#[derive(Debug, Default, Clone)]
pub struct VolatileSnapshot {
    /// keyword -> count, global scope
    pub global: HashMap<String, i64>,
    /// location -> (keyword -> count)
    pub by_location: HashMap<String, HashMap<String, i64>>,
}

impl VolatileSnapshot {
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.by_location.is_empty()
    }
}

/// In-process counter store backed by a single mutex over both tally maps.
///
/// One lock covers global and per-location tallies so that an increment and
/// `snapshot_and_clear` can never interleave: an increment lands entirely in
/// the snapshot or entirely in the cleared store, never half in each.
#[derive(Debug, Default)]
pub struct MemoryKeywordStore {
    tallies: Mutex<VolatileSnapshot>,
}

impl MemoryKeywordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VolatileSnapshot> {
        match self.tallies.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A panicked holder can only have been mid-increment; the
                // tallies are still structurally sound, so recover.
                tracing::warn!("volatile tally mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Whether any tallies are held, global or location-scoped.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of distinct global keywords currently tallied.
    pub fn len(&self) -> usize {
        self.lock().global.len()
    }

    /// Atomically take everything and leave the store empty.
    ///
    /// This is the single critical section the backup task depends on:
    /// each increment is drained exactly once.
    pub fn snapshot_and_clear(&self) -> VolatileSnapshot {
        std::mem::take(&mut *self.lock())
    }

    fn top_of(tallies: &HashMap<String, i64>, limit: usize) -> Vec<RankedKeyword> {
        let mut entries: Vec<RankedKeyword> = tallies
            .iter()
            .map(|(keyword, count)| RankedKeyword {
                keyword: keyword.clone(),
                count: *count,
            })
            .collect();
        // Count descending, then keyword ascending for a stable tie order
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword)));
        entries.truncate(limit);
        entries
    }
}

#[async_trait]
impl BaseKeywordStore for MemoryKeywordStore {
    fn tier(&self) -> TierLabel {
        TierLabel::VolatileCache
    }

    async fn increment_count(&self, keyword: &str, location: Option<&str>) -> Result<()> {
        let mut tallies = self.lock();
        *tallies.global.entry(keyword.to_string()).or_insert(0) += 1;

        if let Some(location) = location {
            *tallies
                .by_location
                .entry(location.to_string())
                .or_default()
                .entry(keyword.to_string())
                .or_insert(0) += 1;
        }
        Ok(())
    }

    async fn top_keywords(&self, limit: usize) -> Result<Vec<RankedKeyword>> {
        let tallies = self.lock();
        Ok(Self::top_of(&tallies.global, limit))
    }

    async fn top_keywords_by_location(
        &self,
        location: &str,
        limit: usize,
    ) -> Result<Vec<RankedKeyword>> {
        let tallies = self.lock();
        Ok(tallies
            .by_location
            .get(location)
            .map(|scoped| Self::top_of(scoped, limit))
            .unwrap_or_default())
    }

    async fn keyword_count(&self, keyword: &str) -> Result<i64> {
        Ok(self.lock().global.get(keyword).copied().unwrap_or(0))
    }

    async fn is_available(&self) -> bool {
        true
    }
}
