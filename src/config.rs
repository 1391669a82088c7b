//! Configuration types for logpull

use crate::error::{Error, Result};
use crate::types::{FinalMode, TimeRange};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for one pipeline run
///
/// Collaborators (CLI, config file loader) are expected to build this and
/// hand it to [`Pipeline::new`](crate::pipeline::Pipeline::new), which calls
/// [`Config::validate`] before any work is dispatched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Root of the per-day log tree (`<log_dir>/<YYYY-MM-DD>/<log_type>.<HH>*`)
    pub log_dir: PathBuf,

    /// Directory the run writes into; must be creatable or empty
    /// (default: `./output-<timestamp>`)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Log type, used verbatim in glob patterns and output file names
    pub log_type: String,

    /// The external filter to run over each matched file
    pub filter: FilterConfig,

    /// Inclusive time range to process
    pub time_range: TimeRange,

    /// Advisory cap on concurrently running filter processes (default: 8)
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// What to do with the per-day files after all days finish
    #[serde(default)]
    pub final_mode: FinalMode,
}

impl Config {
    /// Check the parts of the configuration that can be checked up front
    ///
    /// The output directory is deliberately not probed here; its
    /// creation/emptiness rules run in
    /// [`ensure_output_dir`](crate::utils::ensure_output_dir) so that
    /// validation stays side-effect free.
    pub fn validate(&self) -> Result<()> {
        if self.log_type.is_empty() {
            return Err(Error::config("log_type must not be empty", "log_type"));
        }
        if self.parallelism == 0 {
            return Err(Error::config("parallelism must be at least 1", "parallelism"));
        }
        if self.time_range.start > self.time_range.end {
            return Err(Error::config(
                format!(
                    "start {} is after end {}",
                    self.time_range.start, self.time_range.end
                ),
                "time_range",
            ));
        }
        let meta = std::fs::metadata(&self.log_dir).map_err(|_| {
            Error::config(
                format!("log directory {} does not exist", self.log_dir.display()),
                "log_dir",
            )
        })?;
        if !meta.is_dir() {
            return Err(Error::config(
                format!("log directory {} is not a directory", self.log_dir.display()),
                "log_dir",
            ));
        }
        Ok(())
    }
}

/// The external filter program and its arguments
///
/// The filter must read a log stream on standard input and write its output
/// on standard output; the pipeline wires both ends.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Program name or path; resolved first as a local path, then in `$PATH`
    pub program: String,

    /// Arguments passed to the program on every invocation
    #[serde(default)]
    pub args: Vec<String>,
}

/// One named log-pull set from a collaborator-supplied run configuration
///
/// A run configuration file can describe several sources to pull in one go;
/// each entry derives its own [`Config`] with the set's name as the output
/// subdirectory unless `manual_path` overrides it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataSource {
    /// Name of this pull set, used as the default output subdirectory
    pub name: String,

    /// Log type to pull for this set
    pub log_type: String,

    /// Per-set parallelism override (default: 8)
    #[serde(default = "default_parallelism")]
    pub threads: usize,

    /// Explicit output directory, overriding the name-derived default
    #[serde(default)]
    pub manual_path: Option<PathBuf>,
}

impl DataSource {
    /// Resolve the output directory for this set under `project_dir`
    pub fn output_dir(&self, project_dir: &std::path::Path) -> PathBuf {
        match &self.manual_path {
            Some(path) => path.clone(),
            None => project_dir.join(&self.name),
        }
    }
}

/// A collaborator-supplied run configuration holding many pull sets
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// The log-pull sets to process
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
}

fn default_output_dir() -> PathBuf {
    crate::utils::default_output_dir()
}

fn default_parallelism() -> usize {
    8
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_config(log_dir: PathBuf) -> Config {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Config {
            log_dir,
            output_dir: PathBuf::from("/tmp/logpull-out"),
            log_type: "rdp".to_string(),
            filter: FilterConfig {
                program: "cat".to_string(),
                args: vec![],
            },
            time_range: TimeRange { start, end: start },
            parallelism: 4,
            final_mode: FinalMode::None,
        }
    }

    #[test]
    fn validate_rejects_missing_log_dir() {
        let config = sample_config(PathBuf::from("/definitely/not/here"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log directory"));
    }

    #[test]
    fn validate_rejects_zero_parallelism() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = sample_config(dir.path().to_path_buf());
        config.parallelism = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_log_type() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = sample_config(dir.path().to_path_buf());
        config.log_type.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config(dir.path().to_path_buf());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn data_source_prefers_manual_path() {
        let source = DataSource {
            name: "dns-pull".to_string(),
            log_type: "dns".to_string(),
            threads: 8,
            manual_path: Some(PathBuf::from("/srv/pulls/dns")),
        };
        assert_eq!(
            source.output_dir(std::path::Path::new("/srv/project")),
            PathBuf::from("/srv/pulls/dns")
        );
    }

    #[test]
    fn run_config_parses_with_defaults() {
        let json = r#"{"data_sources": [{"name": "rdp-sweep", "log_type": "rdp"}]}"#;
        let parsed: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data_sources.len(), 1);
        assert_eq!(parsed.data_sources[0].threads, 8);
        assert_eq!(
            parsed.data_sources[0].output_dir(std::path::Path::new("/p")),
            PathBuf::from("/p/rdp-sweep")
        );
    }
}
