//! Core types for logpull

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Inclusive time range processed by a pipeline run, at hour resolution
///
/// Both bounds are local wall-clock times. The pipeline truncates `start` to
/// local midnight to find the first calendar day, but only hours inside
/// `[start, end]` are scanned, so a range starting or ending mid-day does not
/// pull in the rest of those boundary days.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// First hour to process (inclusive)
    pub start: NaiveDateTime,
    /// Last hour to process (inclusive)
    pub end: NaiveDateTime,
}

impl TimeRange {
    /// Create a range, enforcing `start <= end`
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> crate::Result<Self> {
        if start > end {
            return Err(crate::Error::config(
                format!("start {start} is after end {end}"),
                "time_range",
            ));
        }
        Ok(Self { start, end })
    }

    /// Number of calendar days the range touches, inclusive of both ends
    ///
    /// This equals the number of day aggregators a run dispatches.
    pub fn day_count(&self) -> u64 {
        let days = (self.end.date() - self.start.date()).num_days().max(0);
        days as u64 + 1
    }

    /// First calendar day of the range
    pub fn start_day(&self) -> NaiveDate {
        self.start.date()
    }
}

/// What to do with the per-day aggregate files once every day has finished
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalMode {
    /// Leave one `<log_type>-<YYYY-MM-DD>.json` file per day
    #[default]
    None,
    /// Fold all day files into a single `<log_type>.json`, deleting them
    SingleFile,
    /// Stream all day files to standard output, then remove the output directory
    Stdout,
}

/// Snapshot of pipeline progress counters
///
/// Totals grow while discovery is still running: each scanned hour raises
/// `tasks_total` by the number of files it matched, without ever resetting
/// `tasks_done`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Day aggregators that have finished
    pub days_done: u64,
    /// Day aggregators dispatched so far
    pub days_total: u64,
    /// Filter tasks that have finished (success or failure)
    pub tasks_done: u64,
    /// Filter tasks dispatched so far
    pub tasks_total: u64,
    /// Whether the run has completed and counters are final
    pub finished: bool,
}

/// Event emitted during a pipeline run
///
/// Consumers subscribe via [`Pipeline::subscribe`](crate::pipeline::Pipeline::subscribe)
/// and can drive a progress display or log sink without polling.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A filter task was dispatched for one matched input file
    TaskQueued {
        /// The matched input log file
        input: PathBuf,
        /// The temp artifact the task will write
        output: PathBuf,
    },

    /// A filter task finished
    TaskFinished {
        /// The input log file the task processed
        input: PathBuf,
        /// False if the filter failed to open, decompress, spawn, or exit cleanly
        success: bool,
    },

    /// A day aggregator finished
    DayFinished {
        /// The calendar day
        date: NaiveDate,
        /// False if concatenation failed; empty days count as success
        success: bool,
        /// Number of artifacts folded into the day file (0 for an empty day)
        artifacts: usize,
    },

    /// Progress counters changed
    Progress {
        /// Current counter snapshot
        snapshot: ProgressSnapshot,
    },

    /// The run completed, including finalization
    Completed {
        /// Where the output landed (the output directory, or the single
        /// final file when one was requested)
        output: PathBuf,
    },
}

/// Summary of a completed pipeline run
///
/// Per-task and per-day failures are best-effort by design: they are counted
/// here and logged, but never turn [`Pipeline::run`](crate::pipeline::Pipeline::run)
/// into a hard error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Filter tasks dispatched over the whole range
    pub tasks_dispatched: u64,
    /// Filter tasks that logged a failure
    pub tasks_failed: u64,
    /// Days whose aggregate was written successfully
    pub days_succeeded: u64,
    /// Days whose aggregation failed
    pub days_failed: u64,
    /// Days that matched no input files at all
    pub days_empty: u64,
    /// The output directory the run was configured with
    ///
    /// In [`FinalMode::Stdout`] this directory no longer exists when the
    /// report is returned.
    pub output_dir: PathBuf,
    /// The single final file, when [`FinalMode::SingleFile`] was requested
    pub final_file: Option<PathBuf>,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let result = TimeRange::new(at(2024, 1, 2, 0), at(2024, 1, 1, 0));
        assert!(result.is_err());
    }

    #[test]
    fn degenerate_range_spans_one_day() {
        let range = TimeRange::new(at(2024, 1, 1, 5), at(2024, 1, 1, 5)).unwrap();
        assert_eq!(range.day_count(), 1);
    }

    #[test]
    fn mid_day_bounds_still_count_both_days() {
        let range = TimeRange::new(at(2024, 1, 1, 22), at(2024, 1, 2, 3)).unwrap();
        assert_eq!(range.day_count(), 2);
    }

    #[test]
    fn final_mode_serializes_snake_case() {
        let json = serde_json::to_string(&FinalMode::SingleFile).unwrap();
        assert_eq!(json, "\"single_file\"");
    }
}
