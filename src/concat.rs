//! Ordered line-by-line file concatenation
//!
//! Merges many source files into one destination, sorted lexicographically by
//! source path. Callers guarantee that sort order equals the order they want
//! by naming sources with zero-padded timestamp prefixes (see
//! [`crate::utils::artifact_path`]). A single unreadable source degrades
//! gracefully: it is skipped, never aborting the batch.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, warn};

/// Flags controlling a concatenation pass
#[derive(Clone, Copy, Debug, Default)]
pub struct ConcatOptions {
    /// Remove each source after it has been folded into the destination
    pub delete_sources: bool,
    /// Stay quiet about sources that cannot be opened (they are skipped
    /// either way)
    pub ignore_missing: bool,
}

/// Concatenate `sources` into the file at `dest`
///
/// Creates (or truncates) the destination first; failure to create it is the
/// one hard error a concatenation pass can produce.
pub async fn concat_to_file(sources: &[PathBuf], dest: &Path, options: ConcatOptions) -> Result<()> {
    let file = File::create(dest).await?;
    let mut writer = BufWriter::new(file);
    concat_to_writer(sources, &mut writer, options).await?;
    writer.shutdown().await?;
    Ok(())
}

/// Concatenate `sources` into an arbitrary async writer
///
/// Sources are sorted lexicographically before reading. Every line is
/// written with a trailing newline regardless of how the source terminated
/// it. The writer is flushed before returning.
pub async fn concat_to_writer<W>(
    sources: &[PathBuf],
    writer: &mut W,
    options: ConcatOptions,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut ordered: Vec<PathBuf> = sources.to_vec();
    ordered.sort();

    for source in &ordered {
        let file = match File::open(source).await {
            Ok(file) => file,
            Err(err) => {
                if !options.ignore_missing {
                    warn!("could not read file '{}': {err}", source.display());
                }
                continue;
            }
        };
        debug!("concatenating {}", source.display());

        let mut lines = BufReader::new(file).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    writer.write_all(line.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("read error in '{}': {err}", source.display());
                    break;
                }
            }
        }

        if options.delete_sources
            && let Err(err) = tokio::fs::remove_file(source).await
        {
            warn!("could not remove temp file '{}': {err}", source.display());
        }
    }

    writer.flush().await?;
    Ok(())
}
