//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! The only periodic task here is the keyword count backup: it drains the
//! volatile tier into the database on a fixed interval, independent of
//! request traffic.
//!
//! # Architecture
//!
//! ```text
//! Scheduler (every 5 minutes)
//!     │
//!     └─► KeywordCountBackup::run()
//!             ├─► snapshot-and-clear volatile tallies
//!             ├─► additive merge into keyword_counts
//!             └─► push snapshot back into the shared cache if it recovered
//! ```
//!
//! Runs never overlap: a tick that fires while the previous run is still in
//! flight is skipped, so the same volatile snapshot can never be drained
//! twice.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::keywords::KeywordCountBackup;

/// Start the keyword backup scheduler
pub async fn start_scheduler(
    backup: Arc<KeywordCountBackup>,
    interval: Duration,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let run_guard = Arc::new(tokio::sync::Mutex::new(()));
    let backup_job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let backup = backup.clone();
        let run_guard = run_guard.clone();
        Box::pin(async move {
            // Non-overlap guard: skip the tick if the previous run is still going
            let _running = match run_guard.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::warn!("Previous keyword backup still in progress, skipping tick");
                    return;
                }
            };

            if let Err(e) = backup.run().await {
                tracing::error!("Keyword backup task failed: {}", e);
            }
        })
    })?;

    scheduler.add(backup_job).await?;
    scheduler.start().await?;

    tracing::info!(
        "Scheduled tasks started (keyword backup every {} seconds)",
        interval.as_secs()
    );
    Ok(scheduler)
}
