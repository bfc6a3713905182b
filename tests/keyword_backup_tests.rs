//! Integration tests for the reconciliation path: volatile tallies draining
//! into the database, additive merges, and shared-cache restoration.

mod common;

use std::sync::Arc;

use crate::common::TestHarness;
use keyword_ranking::config::Config;
use keyword_ranking::domains::keywords::models::Keyword;
use keyword_ranking::domains::keywords::KeywordRankingRuntime;
use keyword_ranking::{BaseKeywordStore, TierLabel};
use test_context::test_context;

// =============================================================================
// Draining
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn volatile_tallies_drain_into_the_database(ctx: &TestHarness) {
    let rt = ctx.runtime_without_shared();

    for _ in 0..3 {
        rt.service.record_search("pizza", None).await;
    }
    rt.service.record_search("sushi", Some("seoul")).await;
    rt.service.record_search("sushi", Some("seoul")).await;

    rt.backup.run().await.expect("backup failed");

    assert!(rt.volatile.is_empty());
    assert_eq!(rt.durable.keyword_count("pizza").await.unwrap(), 3);
    assert_eq!(rt.durable.keyword_count("sushi").await.unwrap(), 2);

    let seoul = rt.durable.top_keywords_by_location("seoul", 10).await.unwrap();
    assert_eq!(seoul.len(), 1);
    assert_eq!(seoul[0].keyword, "sushi");
    assert_eq!(seoul[0].count, 2);

    // With shared down and volatile drained, rankings now come from durable
    let popular = rt.service.popular_keywords(None, Some(10)).await;
    assert_eq!(popular.source, TierLabel::Durable);
    assert_eq!(popular.keywords[0].keyword, "pizza");
    assert_eq!(popular.keywords[0].count, 3);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn empty_volatile_tier_makes_backup_a_no_op(ctx: &TestHarness) {
    let rt = ctx.runtime_without_shared();

    rt.backup.run().await.expect("backup failed");

    assert!(rt.durable.top_keywords(10).await.unwrap().is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn rerunning_backup_does_not_double_count(ctx: &TestHarness) {
    let rt = ctx.runtime_without_shared();

    rt.service.record_search("pizza", None).await;
    rt.service.record_search("pizza", None).await;

    rt.backup.run().await.expect("backup failed");
    rt.backup.run().await.expect("backup failed");

    // The second run saw an empty volatile tier; nothing merged twice
    assert_eq!(rt.durable.keyword_count("pizza").await.unwrap(), 2);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn backups_merge_additively_across_runs(ctx: &TestHarness) {
    let rt = ctx.runtime_without_shared();

    rt.service.record_search("pizza", None).await;
    rt.service.record_search("pizza", None).await;
    rt.backup.run().await.expect("backup failed");

    for _ in 0..3 {
        rt.service.record_search("pizza", None).await;
    }
    rt.backup.run().await.expect("backup failed");

    assert_eq!(rt.durable.keyword_count("pizza").await.unwrap(), 5);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn unknown_keywords_are_skipped_not_fatal(ctx: &TestHarness) {
    let rt = ctx.runtime_without_shared();

    // Tally a keyword that never went through the write path, so no
    // keyword row exists for it
    rt.volatile.increment_count("ghost", None).await.unwrap();
    rt.service.record_search("pizza", None).await;

    rt.backup.run().await.expect("backup failed");

    assert!(rt.volatile.is_empty());
    assert_eq!(rt.durable.keyword_count("pizza").await.unwrap(), 1);
    assert_eq!(rt.durable.keyword_count("ghost").await.unwrap(), 0);
}

// =============================================================================
// Commutativity
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_all_survive_reconciliation(ctx: &TestHarness) {
    let rt = ctx.runtime_without_shared();
    let service = Arc::new(rt.service);

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    service.record_search("ramen", None).await;
                }
            })
        })
        .collect();
    for result in futures::future::join_all(tasks).await {
        result.expect("recording task panicked");
    }

    rt.backup.run().await.expect("backup failed");

    assert!(rt.volatile.is_empty());
    assert_eq!(rt.durable.keyword_count("ramen").await.unwrap(), 1000);
}

// =============================================================================
// Shared-cache restoration
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn recovered_shared_cache_is_restored_from_the_snapshot(ctx: &TestHarness) {
    let rt = ctx.runtime();

    // Simulate counts that accrued while the shared cache was down: the
    // write path had upserted the keyword rows, the increments landed in
    // the volatile tier.
    Keyword::find_or_create("pizza", "pizza", &ctx.db_pool).await.unwrap();
    Keyword::find_or_create("sushi", "sushi", &ctx.db_pool).await.unwrap();
    rt.volatile.increment_count("pizza", None).await.unwrap();
    rt.volatile.increment_count("pizza", Some("seoul")).await.unwrap();
    rt.volatile.increment_count("sushi", None).await.unwrap();

    rt.backup.run().await.expect("backup failed");

    // Database has the counts
    assert_eq!(rt.durable.keyword_count("pizza").await.unwrap(), 2);
    assert_eq!(rt.durable.keyword_count("sushi").await.unwrap(), 1);

    // And so does the recovered shared cache, including the location scope
    assert_eq!(rt.shared.keyword_count("pizza").await.unwrap(), 2);
    let seoul = rt.shared.top_keywords_by_location("seoul", 10).await.unwrap();
    assert_eq!(seoul[0].keyword, "pizza");
    assert_eq!(seoul[0].count, 1);

    // Rankings read from the shared cache again
    let popular = rt.service.popular_keywords(None, Some(10)).await;
    assert_eq!(popular.source, TierLabel::SharedCache);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn restoration_is_additive_over_existing_cache_counts(ctx: &TestHarness) {
    let rt = ctx.runtime();

    // The cache already holds counts of its own after recovering
    rt.service.record_search("pizza", None).await;

    // Plus stale volatile data from the outage window
    rt.volatile.increment_count("pizza", None).await.unwrap();
    rt.volatile.increment_count("pizza", None).await.unwrap();

    rt.backup.run().await.expect("backup failed");

    // 1 live + 2 restored, not clobbered to 2
    assert_eq!(rt.shared.keyword_count("pizza").await.unwrap(), 3);
}

// =============================================================================
// Scheduler
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scheduler_drains_on_its_interval(ctx: &TestHarness) {
    let config = Config {
        database_url: String::new(),
        redis_url: "redis://127.0.0.1:1".to_string(),
        backup_interval_secs: 1,
        redis_probe_timeout_ms: 200,
    };
    let rt = KeywordRankingRuntime::from_pool(ctx.db_pool.clone(), &config)
        .expect("Failed to wire ranking runtime");

    rt.service.record_search("pizza", None).await;
    rt.service.record_search("pizza", None).await;

    let mut scheduler = rt.start_backup_scheduler().await.expect("scheduler failed to start");

    // First tick fires after one interval; give it a little headroom
    tokio::time::sleep(std::time::Duration::from_millis(2500)).await;

    assert!(rt.volatile.is_empty());
    assert_eq!(rt.durable.keyword_count("pizza").await.unwrap(), 2);

    scheduler.shutdown().await.expect("scheduler failed to shut down");
}
