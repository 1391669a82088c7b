//! Pipeline driver — time-range iteration, discovery, dispatch, finalization
//!
//! The driver walks the configured range day by day and hour by hour,
//! globbing for input files per hour and dispatching one filter task per
//! match plus one aggregator per day. Completion is synchronized on two
//! levels: each day's aggregator waits on that day's barrier, the driver
//! waits on the global barrier. Once every day has finished, the optional
//! final fold (single file or stdout stream) runs and the report is built.
//!
//! Per-unit failures never abort a run. A failed glob loses one hour, a
//! failed filter loses one artifact, a failed concatenation loses one day
//! file; everything else completes and the report counts the damage.

mod aggregate;
mod task;

use crate::barrier::CompletionBarrier;
use crate::concat::{self, ConcatOptions};
use crate::config::Config;
use crate::error::Result;
use crate::filter::{CliFilter, FilterHandler};
use crate::progress::ProgressTracker;
use crate::types::{Event, FinalMode, PipelineReport, ProgressSnapshot};
use crate::utils;
use chrono::NaiveTime;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Semaphore, broadcast};
use tracing::{debug, error, info};

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Shared state owned by one pipeline run
///
/// Passed by `Arc` to every dispatched unit; there is no other shared
/// mutable state.
pub(crate) struct PipelineContext {
    pub(crate) config: Config,
    pub(crate) filter: Arc<dyn FilterHandler>,
    pub(crate) progress: ProgressTracker,
    pub(crate) global_barrier: CompletionBarrier,
    pub(crate) permits: Arc<Semaphore>,
    event_tx: broadcast::Sender<Event>,

    // Report counters, written by units as they finish.
    pub(crate) tasks_failed: AtomicU64,
    pub(crate) days_succeeded: AtomicU64,
    pub(crate) days_failed: AtomicU64,
    pub(crate) days_empty: AtomicU64,
}

impl PipelineContext {
    pub(crate) fn emit(&self, event: Event) {
        // No receivers is fine; events are an optional consumer surface.
        let _ = self.event_tx.send(event);
    }

    pub(crate) fn emit_progress(&self) {
        self.emit(Event::Progress {
            snapshot: self.progress.snapshot(),
        });
    }
}

/// A configured pipeline, ready to run once
///
/// # Example
///
/// ```no_run
/// use logpull::{Config, FilterConfig, FinalMode, Pipeline, TimeRange};
/// use chrono::NaiveDate;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let config = Config {
///     log_dir: "/data/zeek/logs".into(),
///     output_dir: "./rdp-pull".into(),
///     log_type: "rdp".to_string(),
///     filter: FilterConfig {
///         program: "grecidr".to_string(),
///         args: vec!["10.0.0.0/24".to_string()],
///     },
///     time_range: TimeRange::new(
///         day.and_hms_opt(0, 0, 0).unwrap(),
///         day.and_hms_opt(23, 0, 0).unwrap(),
///     )?,
///     parallelism: 8,
///     final_mode: FinalMode::SingleFile,
/// };
///
/// let pipeline = Pipeline::new(config)?;
/// let report = pipeline.run().await?;
/// println!("complete, output: {}", report.output_dir.display());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    ctx: Arc<PipelineContext>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.ctx.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Build a pipeline, resolving the configured filter executable
    ///
    /// Fails fast on invalid configuration or an unresolvable filter;
    /// nothing is dispatched and nothing touches the filesystem yet.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let filter = Arc::new(CliFilter::resolve(&config.filter)?);
        Self::with_filter(config, filter)
    }

    /// Build a pipeline around a custom [`FilterHandler`]
    ///
    /// This is the seam tests and embedders use to run the pipeline without
    /// an external process.
    pub fn with_filter(config: Config, filter: Arc<dyn FilterHandler>) -> Result<Self> {
        config.validate()?;
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let ctx = PipelineContext {
            permits: Arc::new(Semaphore::new(config.parallelism)),
            config,
            filter,
            progress: ProgressTracker::new(),
            global_barrier: CompletionBarrier::new(),
            event_tx,
            tasks_failed: AtomicU64::new(0),
            days_succeeded: AtomicU64::new(0),
            days_failed: AtomicU64::new(0),
            days_empty: AtomicU64::new(0),
        };
        Ok(Self { ctx: Arc::new(ctx) })
    }

    /// Subscribe to run events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.ctx.event_tx.subscribe()
    }

    /// Current progress counters
    pub fn progress(&self) -> ProgressSnapshot {
        self.ctx.progress.snapshot()
    }

    /// Run the pipeline to completion
    ///
    /// The only hard errors are pre-dispatch ones (an unusable output
    /// directory). Once dispatch begins the run always reaches global
    /// completion; per-unit failures are logged, emitted as events, and
    /// counted in the returned [`PipelineReport`].
    pub async fn run(&self) -> Result<PipelineReport> {
        let range = self.ctx.config.time_range;
        let output_dir = self.ctx.config.output_dir.clone();
        let log_type = self.ctx.config.log_type.clone();

        utils::ensure_output_dir(&output_dir, true)?;
        debug!("created dir {}", output_dir.display());

        // The day total is known up front; the task total grows per hour.
        self.ctx.progress.add_days(range.day_count());
        self.ctx.emit_progress();

        let mut day_files: Vec<PathBuf> = Vec::new();
        let mut cur_time = range.start;
        let mut cur_date = range.start_day();
        let end_date = range.end.date();

        while cur_date <= end_date {
            let day_barrier = CompletionBarrier::new();
            let mut artifacts: Vec<PathBuf> = Vec::new();

            let next_midnight = match cur_date.succ_opt() {
                Some(next) => next.and_time(NaiveTime::MIN),
                // Date overflow; nothing beyond this day can exist.
                None => range.end + chrono::Duration::hours(1),
            };

            while cur_time < next_midnight && cur_time <= range.end {
                let pattern = utils::hour_glob(&self.ctx.config.log_dir, &log_type, cur_time);
                match glob::glob(&pattern) {
                    Err(err) => {
                        // One bad hour is not fatal; continue the scan.
                        error!("({cur_time}): {err}");
                    }
                    Ok(matches) => {
                        for entry in matches {
                            let input = match entry {
                                Ok(path) => path,
                                Err(err) => {
                                    error!("({cur_time}): {err}");
                                    continue;
                                }
                            };
                            let artifact = utils::artifact_path(&output_dir, cur_time, &input);
                            artifacts.push(artifact.clone());

                            self.ctx.progress.add_tasks(1);
                            self.ctx.emit_progress();
                            day_barrier.register(1);
                            task::spawn(
                                Arc::clone(&self.ctx),
                                day_barrier.clone(),
                                input,
                                artifact,
                                cur_time,
                            );
                        }
                    }
                }
                cur_time += chrono::Duration::hours(1);
            }

            let day_file = utils::day_file_path(&output_dir, &log_type, cur_date);
            day_files.push(day_file.clone());
            self.ctx.global_barrier.register(1);
            aggregate::spawn(
                Arc::clone(&self.ctx),
                day_barrier,
                artifacts,
                cur_date,
                day_file,
            );

            cur_date = match cur_date.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        debug!("all units dispatched, waiting for completion");
        self.ctx.global_barrier.wait_zero().await;

        let final_file = self.finalize(&day_files).await;

        self.ctx.progress.finalize();
        self.ctx.emit_progress();

        let output = final_file.clone().unwrap_or_else(|| output_dir.clone());
        info!("complete, output: {}", output.display());
        self.ctx.emit(Event::Completed { output });

        Ok(PipelineReport {
            tasks_dispatched: self.ctx.progress.snapshot().tasks_total,
            tasks_failed: self.ctx.tasks_failed.load(Ordering::Relaxed),
            days_succeeded: self.ctx.days_succeeded.load(Ordering::Relaxed),
            days_failed: self.ctx.days_failed.load(Ordering::Relaxed),
            days_empty: self.ctx.days_empty.load(Ordering::Relaxed),
            output_dir,
            final_file,
        })
    }

    /// Fold the day files according to the configured final mode
    ///
    /// Finalization failures are logged, never propagated; the day files (or
    /// whatever survived of them) are the fallback output.
    async fn finalize(&self, day_files: &[PathBuf]) -> Option<PathBuf> {
        let output_dir = &self.ctx.config.output_dir;
        let options = ConcatOptions {
            delete_sources: true,
            ignore_missing: true,
        };

        match self.ctx.config.final_mode {
            FinalMode::None => None,
            FinalMode::SingleFile => {
                let final_file = utils::final_file_path(output_dir, &self.ctx.config.log_type);
                info!(
                    "concatenating all output into a single {}",
                    final_file.display()
                );
                match concat::concat_to_file(day_files, &final_file, options).await {
                    Ok(()) => Some(final_file),
                    Err(err) => {
                        error!("{err}");
                        None
                    }
                }
            }
            FinalMode::Stdout => {
                let mut stdout = tokio::io::stdout();
                if let Err(err) = concat::concat_to_writer(day_files, &mut stdout, options).await {
                    error!("{err}");
                }
                // Everything was folded into the stream; drop the now-empty
                // directory.
                if let Err(err) = tokio::fs::remove_dir(output_dir).await {
                    error!(
                        "could not remove temp directory '{}': {err}",
                        output_dir.display()
                    );
                }
                None
            }
        }
    }
}
