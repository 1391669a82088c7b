//! # logpull
//!
//! Time-partitioned parallel log filter pipeline library.
//!
//! logpull walks an hour-resolution time range over a per-day log tree
//! (`<log_dir>/<YYYY-MM-DD>/<log_type>.<HH>*`), runs every matched file
//! through an external filter program (stdin in, stdout out), and
//! aggregates the filtered output by calendar day — optionally folding all
//! days into a single file or streaming them to standard output.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI; argument parsing, config files, and
//!   prompts are the embedding application's job
//! - **Best-effort** - Once dispatch begins the run always completes; a bad
//!   hour, file, or day is logged and counted, never fatal
//! - **Bounded** - Concurrent external filter processes are capped by an
//!   explicit parallelism setting
//! - **Event-driven** - Consumers subscribe to progress and completion
//!   events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use logpull::{Config, FilterConfig, FinalMode, Pipeline, TimeRange};
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//!     let config = Config {
//!         log_dir: "/data/zeek/logs".into(),
//!         output_dir: "./rdp-pull".into(),
//!         log_type: "rdp".to_string(),
//!         filter: FilterConfig {
//!             program: "grecidr".to_string(),
//!             args: vec!["10.0.0.0/24".to_string()],
//!         },
//!         time_range: TimeRange::new(
//!             day.and_hms_opt(0, 0, 0).unwrap(),
//!             day.and_hms_opt(23, 0, 0).unwrap(),
//!         )?,
//!         parallelism: 8,
//!         final_mode: FinalMode::None,
//!     };
//!
//!     let pipeline = Pipeline::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = pipeline.run().await?;
//!     println!("complete, output: {}", report.output_dir.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Counting completion barrier
pub mod barrier;
/// Ordered line-by-line concatenation
pub mod concat;
/// Configuration types
pub mod config;
/// Transparent input decompression
pub mod decompress;
/// Error types
pub mod error;
/// Filter execution seam
pub mod filter;
/// Pipeline driver (decomposed into focused submodules)
pub mod pipeline;
/// Progress accounting
pub mod progress;
/// Core types and events
pub mod types;
/// Directory handling and output naming
pub mod utils;

// Re-export commonly used types
pub use barrier::CompletionBarrier;
pub use concat::ConcatOptions;
pub use config::{Config, DataSource, FilterConfig, RunConfig};
pub use error::{Error, Result};
pub use filter::{CliFilter, FilterHandler};
pub use pipeline::Pipeline;
pub use progress::ProgressTracker;
pub use types::{Event, FinalMode, PipelineReport, ProgressSnapshot, TimeRange};
