//! Error types for logpull
//!
//! Only a small set of conditions are hard errors: invalid configuration and
//! an unusable output directory, both detected before anything is dispatched.
//! Everything that goes wrong after dispatch (a missing hour, a filter that
//! exits non-zero, a day that fails to concatenate) is logged, reflected in
//! the [`PipelineReport`](crate::types::PipelineReport), and otherwise
//! isolated so the rest of the run completes.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for logpull operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for logpull
///
/// Variants carry enough context (paths, config keys) to diagnose the issue
/// without a debugger.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "log_dir")
        key: Option<String>,
    },

    /// A non-directory entry already exists where the output directory should go
    #[error("cannot create output directory {path}: a file of the same name exists")]
    Conflict {
        /// The conflicting path
        path: PathBuf,
    },

    /// The output directory exists but is not empty
    #[error("cannot use output directory {path}: directory exists and is non-empty")]
    NonEmpty {
        /// The non-empty directory
        path: PathBuf,
    },

    /// Filter executable could not be resolved locally or in PATH
    #[error("could not find an executable '{program}': make sure it exists and is marked as executable")]
    FilterNotFound {
        /// The program name the caller asked for
        program: String,
    },

    /// Filter process failed to spawn or exited abnormally
    #[error("filter '{program}' failed on {input}: {reason}")]
    Filter {
        /// The resolved filter executable
        program: String,
        /// The input file being filtered
        input: PathBuf,
        /// What went wrong (spawn, I/O, or exit status)
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Convenience constructor for configuration errors
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}
