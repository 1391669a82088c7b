//! Day aggregator unit — folds one day's artifacts into its aggregate file.

use super::PipelineContext;
use crate::barrier::CompletionBarrier;
use crate::concat::{self, ConcatOptions};
use crate::types::Event;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};

/// Spawn one day aggregator
///
/// Waits until every task of its day has signaled the day barrier, then
/// concatenates the day's artifacts (deleting them, tolerating individually
/// missing ones) into the day file. Runs as its own task so a slow day never
/// blocks aggregation of later days. Always signals the global barrier and
/// bumps day progress exactly once.
pub(super) fn spawn(
    ctx: Arc<PipelineContext>,
    day_barrier: CompletionBarrier,
    artifacts: Vec<PathBuf>,
    date: NaiveDate,
    day_file: PathBuf,
) {
    tokio::spawn(async move {
        day_barrier.wait_zero().await;

        info!(
            "all logs for {date} finished, concatenating into '{}'",
            day_file.display()
        );

        let mut success = true;
        if artifacts.is_empty() {
            warn!("no matches for date {date}, skipping");
            ctx.days_empty.fetch_add(1, Ordering::Relaxed);
        } else {
            let options = ConcatOptions {
                delete_sources: true,
                ignore_missing: true,
            };
            match concat::concat_to_file(&artifacts, &day_file, options).await {
                Ok(()) => {
                    ctx.days_succeeded.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    error!("{err}");
                    ctx.days_failed.fetch_add(1, Ordering::Relaxed);
                    success = false;
                }
            }
        }

        if success {
            info!("SUCCESS: {date}");
        } else {
            error!("FAIL: {date}");
        }

        ctx.emit(Event::DayFinished {
            date,
            success,
            artifacts: artifacts.len(),
        });
        ctx.global_barrier.complete();
        ctx.progress.day_done();
        ctx.emit_progress();
    });
}
