//! Filter execution seam
//!
//! The pipeline treats the filter as an opaque program that reads a log
//! stream on standard input and writes its output on standard output.
//! [`FilterHandler`] is the seam: production code uses [`CliFilter`] around
//! an external executable, tests substitute in-process handlers.

use crate::config::FilterConfig;
use crate::decompress;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// A filter applied to one input file, producing one output file
#[async_trait]
pub trait FilterHandler: Send + Sync {
    /// Filter `input` into `output`
    ///
    /// The input may be compressed; implementations are expected to read it
    /// through [`decompress::open_input`] or equivalent.
    async fn apply(&self, input: &Path, output: &Path) -> Result<()>;

    /// Short name for log lines
    fn name(&self) -> &str;
}

/// Filter handler running an external executable
///
/// The input file is opened with transparent decompression and streamed to
/// the child's standard input; the child's standard output is wired straight
/// into the output file. Standard error is discarded.
#[derive(Debug)]
pub struct CliFilter {
    program: PathBuf,
    args: Vec<String>,
}

impl CliFilter {
    /// Create a handler from an already-resolved executable path
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }

    /// Resolve a configured filter into a runnable handler
    ///
    /// Resolution is two-step: a local path candidate first (so `./my.sh`
    /// and plain file names in the working directory win), then a `$PATH`
    /// search. Fails with [`Error::FilterNotFound`] when neither yields an
    /// executable.
    pub fn resolve(config: &FilterConfig) -> Result<Self> {
        let local = std::path::absolute(&config.program).ok();
        let resolved = local
            .filter(|candidate| candidate.is_file())
            .and_then(|candidate| which::which(&candidate).ok())
            .or_else(|| which::which(&config.program).ok())
            .ok_or_else(|| Error::FilterNotFound {
                program: config.program.clone(),
            })?;
        Ok(Self::new(resolved, config.args.clone()))
    }

    /// The resolved executable path
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn error(&self, input: &Path, reason: impl Into<String>) -> Error {
        Error::Filter {
            program: self.program.display().to_string(),
            input: input.to_path_buf(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl FilterHandler for CliFilter {
    async fn apply(&self, input: &Path, output: &Path) -> Result<()> {
        let mut reader = decompress::open_input(input).await?;
        let out_file = tokio::fs::File::create(output).await?.into_std().await;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::from(out_file))
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| self.error(input, format!("failed to spawn: {err}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.error(input, "child stdin was not piped"))?;

        let copied = tokio::io::copy(&mut reader, &mut stdin).await;
        // Close stdin so the child sees EOF before we wait on it.
        drop(stdin);

        let status = child
            .wait()
            .await
            .map_err(|err| self.error(input, format!("wait failed: {err}")))?;

        if !status.success() {
            return Err(self.error(input, format!("exited with {status}")));
        }
        // A filter may stop reading before EOF (head-like programs); a broken
        // pipe with a clean exit is not a failure.
        if let Err(err) = copied
            && err.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(self.error(input, format!("streaming input failed: {err}")));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "cli-filter"
    }
}
