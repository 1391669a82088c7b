//! Utility functions for directory handling and output path naming
//!
//! All output names funnel through the helpers here. That keeps the ordering
//! invariant in one place: the output directory prefix is constant within a
//! run and artifact names start with a zero-padded `YYYYMMDDHH` stamp, so a
//! plain lexicographic sort of artifact paths equals chronological order.

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

/// Format for the timestamp prefix on temp artifact names
///
/// Zero-padded and most-significant-first, which is what makes path sort
/// order chronological.
const HOUR_PREFIX_FORMAT: &str = "%Y%m%d%H";

/// Prepare the output directory for a run
///
/// Idempotent creation with validation, performing at most one `mkdir` and
/// nothing at all on failure:
///
/// - absent: the parent must exist and be a directory, then the directory is
///   created
/// - present but not a directory: [`Error::Conflict`]
/// - present directory: must be writable; with `must_be_empty` set it must
///   also hold zero entries ([`Error::NonEmpty`])
pub fn ensure_output_dir(dir: &Path, must_be_empty: bool) -> Result<()> {
    let meta = match std::fs::metadata(dir) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            // A bare relative name like "out" has an empty parent; that means
            // the current directory.
            let parent = match dir.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let parent_meta = std::fs::metadata(parent).map_err(|_| {
                Error::config(
                    format!("cannot use parent directory {}: does not exist", parent.display()),
                    "output_dir",
                )
            })?;
            if !parent_meta.is_dir() {
                return Err(Error::config(
                    format!(
                        "cannot use parent directory {}: exists but is not a directory",
                        parent.display()
                    ),
                    "output_dir",
                ));
            }
            std::fs::create_dir(dir)?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if !meta.is_dir() {
        return Err(Error::Conflict {
            path: dir.to_path_buf(),
        });
    }

    if meta.permissions().readonly() {
        return Err(Error::config(
            format!("output directory {} is not writable", dir.display()),
            "output_dir",
        ));
    }

    if must_be_empty {
        let mut entries = std::fs::read_dir(dir)?;
        if entries.next().is_some() {
            return Err(Error::NonEmpty {
                path: dir.to_path_buf(),
            });
        }
    }

    Ok(())
}

/// Default output directory name, `./output-<timestamp>`
pub fn default_output_dir() -> PathBuf {
    PathBuf::from(format!(
        "output-{}",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ))
}

/// Temp artifact path for one matched input file
///
/// `<output_dir>/<YYYYMMDDHH><input base name>.json`. The hour stamp makes
/// the name deterministic and sortable; the base name keeps sibling matches
/// within the same hour distinct.
pub fn artifact_path(output_dir: &Path, hour: NaiveDateTime, input: &Path) -> PathBuf {
    let base = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{}{base}.json", hour.format(HOUR_PREFIX_FORMAT)))
}

/// Per-day aggregate path, `<output_dir>/<log_type>-<YYYY-MM-DD>.json`
pub fn day_file_path(output_dir: &Path, log_type: &str, date: NaiveDate) -> PathBuf {
    output_dir.join(format!("{log_type}-{}.json", date.format("%Y-%m-%d")))
}

/// Single-file final output path, `<output_dir>/<log_type>.json`
pub fn final_file_path(output_dir: &Path, log_type: &str) -> PathBuf {
    output_dir.join(format!("{log_type}.json"))
}

/// Glob pattern matching one hour's input files
///
/// `<log_dir>/<YYYY-MM-DD>/<log_type>.<HH>*` — `log_type` is used verbatim,
/// as configured.
pub fn hour_glob(log_dir: &Path, log_type: &str, hour: NaiveDateTime) -> String {
    format!(
        "{}/{}/{log_type}.{}*",
        log_dir.display(),
        hour.format("%Y-%m-%d"),
        hour.format("%H"),
    )
}
