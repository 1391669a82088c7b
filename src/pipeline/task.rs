//! Filter task unit — one external filter run over one matched input file.

use super::PipelineContext;
use crate::barrier::CompletionBarrier;
use crate::types::Event;
use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{debug, error};

/// Spawn one filter task
///
/// The task acquires a permit from the shared semaphore before running the
/// filter, which caps concurrently running external processes at the
/// configured parallelism. Whatever happens — open, decompress, spawn, or
/// exit failure — the task signals its day barrier and bumps task progress
/// exactly once; failures are logged and isolated.
pub(super) fn spawn(
    ctx: Arc<PipelineContext>,
    day_barrier: CompletionBarrier,
    input: PathBuf,
    output: PathBuf,
    hour: NaiveDateTime,
) {
    ctx.emit(Event::TaskQueued {
        input: input.clone(),
        output: output.clone(),
    });

    tokio::spawn(async move {
        debug!("queued: {} -> {}", input.display(), output.display());

        let success = match ctx.permits.clone().acquire_owned().await {
            Ok(_permit) => match ctx.filter.apply(&input, &output).await {
                Ok(()) => true,
                Err(err) => {
                    error!("({hour}): {err}");
                    false
                }
            },
            // The semaphore lives as long as the context; a closed semaphore
            // still must not leave the day barrier hanging.
            Err(_) => false,
        };

        if !success {
            ctx.tasks_failed.fetch_add(1, Ordering::Relaxed);
        }

        ctx.emit(Event::TaskFinished {
            input,
            success,
        });
        day_barrier.complete();
        ctx.progress.task_done();
        ctx.emit_progress();
    });
}
