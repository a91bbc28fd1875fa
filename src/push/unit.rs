//! Transfer units.
//!
//! A transfer unit wraps one workspace file as a lazily-read sequence of
//! fixed-size chunks. The file handle is opened only when streaming starts
//! and dropped when the sequence is exhausted; the sequence is not
//! restartable. The size is captured at enumeration time; a file mutated
//! mid-push is undefined behavior, not detected here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};

/// Chunk size for file data on the wire. The final chunk of a file is
/// sized to the remaining bytes.
pub const CHUNK_SIZE: usize = 256 * 1024;

/// One file scheduled for transfer.
#[derive(Debug, Clone)]
pub struct TransferUnit {
    path: PathBuf,
    size: u64,
}

impl TransferUnit {
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }

    /// Absolute local path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte size captured at enumeration time.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Open the file and start its chunk sequence.
    pub async fn open(&self) -> Result<ChunkStream> {
        let file = File::open(&self.path)
            .await
            .with_context(|| format!("failed to open {} for transfer", self.path.display()))?;
        Ok(ChunkStream {
            reader: BufReader::new(file),
            buf: vec![0u8; CHUNK_SIZE],
        })
    }
}

/// Lazy chunk sequence over an open file.
pub struct ChunkStream {
    reader: BufReader<File>,
    buf: Vec<u8>,
}

impl ChunkStream {
    /// Next chunk, or `None` at end of file.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        let n = self
            .reader
            .read(&mut self.buf)
            .await
            .context("failed to read file chunk")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(Bytes::copy_from_slice(&self.buf[..n])))
    }
}
