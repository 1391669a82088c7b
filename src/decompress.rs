//! Transparent input decompression
//!
//! Log stores rotate files as plain text, gzip, or zstd depending on site
//! policy, so the task runner never assumes a format: the first bytes of the
//! file decide. Detection uses magic bytes (gzip `1F 8B`, zstd `28 B5 2F FD`)
//! rather than file extensions, which are unreliable for rotated logs.

use crate::error::Result;
use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Boxed reader over a possibly-compressed input file
pub type InputReader = Box<dyn AsyncRead + Send + Unpin>;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Open `path` for reading, decompressing on the fly when needed
///
/// Files shorter than a magic prefix (including empty files) are treated as
/// plain text. Gzip inputs may hold multiple members, as rotated logs
/// appended with `gzip >>` do.
pub async fn open_input(path: &Path) -> Result<InputReader> {
    let file = File::open(path).await?;
    let mut reader = BufReader::with_capacity(8192, file);

    // Peek without consuming; the decoder (or passthrough) re-reads these bytes.
    let header = reader.fill_buf().await?;

    if header.starts_with(&GZIP_MAGIC) {
        let mut decoder = GzipDecoder::new(reader);
        decoder.multiple_members(true);
        Ok(Box::new(decoder))
    } else if header.starts_with(&ZSTD_MAGIC) {
        Ok(Box::new(ZstdDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tokio::io::AsyncReadExt;

    async fn read_all(path: &Path) -> String {
        let mut reader = open_input(path).await.unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn plain_file_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rdp.00.log");
        std::fs::write(&path, "plain line\n").unwrap();
        assert_eq!(read_all(&path).await, "plain line\n");
    }

    #[tokio::test]
    async fn gzip_file_is_decompressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rdp.00.log.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"compressed line\n").unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();
        assert_eq!(read_all(&path).await, "compressed line\n");
    }

    #[tokio::test]
    async fn multi_member_gzip_reads_every_member() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rdp.00.log.gz");

        let mut bytes = Vec::new();
        for chunk in ["first\n", "second\n"] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(chunk.as_bytes()).unwrap();
            bytes.extend(encoder.finish().unwrap());
        }
        std::fs::write(&path, bytes).unwrap();

        assert_eq!(read_all(&path).await, "first\nsecond\n");
    }

    #[tokio::test]
    async fn empty_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rdp.00.log");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(read_all(&path).await, "");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_input(&dir.path().join("nope.log")).await;
        assert!(result.is_err());
    }
}
