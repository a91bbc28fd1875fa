//! Branch transfer sequencing.
//!
//! For one branch: every file in enumeration order (wire path line, byte
//! size line, raw chunks), then the branch completion marker. The marker
//! is sent last so the remote records the branch as complete only once all
//! of its data arrived; a crash mid-branch leaves no marker and the next
//! push retransmits the branch from scratch.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::progress::ProgressSink;
use crate::push::unit::TransferUnit;
use crate::transport::Transport;

/// Marker file name announced after a unit's real data.
pub const MARKER_NAME: &str = ".flags";

/// Fixed marker payload; the remote only cares that the marker arrived.
pub const MARKER_PAYLOAD: &[u8] = b"ok";

/// Compute a file's wire path: the local path relative to the workspace
/// root, under the remote project, always `/`-separated.
pub fn wire_path(root: &Path, file: &Path, project: &str) -> Result<String> {
    let relative = file
        .strip_prefix(root)
        .with_context(|| format!("{} is outside workspace {}", file.display(), root.display()))?;
    let mut path = String::from(project);
    for component in relative.components() {
        path.push('/');
        path.push_str(&component.as_os_str().to_string_lossy());
    }
    Ok(path)
}

/// Transfers the files of one branch, then its completion marker.
pub struct BranchSequencer<'a> {
    root: &'a Path,
    project: &'a str,
}

impl<'a> BranchSequencer<'a> {
    pub fn new(root: &'a Path, project: &'a str) -> Self {
        Self { root, project }
    }

    /// Send every file of `branch` in order, then the branch marker.
    /// Returns the number of file bytes put on the wire.
    pub async fn transfer_branch(
        &self,
        transport: &mut dyn Transport,
        branch: &str,
        files: &[TransferUnit],
        progress: &mut dyn ProgressSink,
    ) -> Result<u64> {
        let mut bytes = 0u64;
        for unit in files {
            bytes += self.send_file(transport, unit, progress).await?;
        }

        let marker = format!("{}/{}/{}", self.project, branch, MARKER_NAME);
        send_marker(transport, &marker).await?;
        debug!(branch, bytes, "branch complete");
        Ok(bytes)
    }

    async fn send_file(
        &self,
        transport: &mut dyn Transport,
        unit: &TransferUnit,
        progress: &mut dyn ProgressSink,
    ) -> Result<u64> {
        let path = wire_path(self.root, unit.path(), self.project)?;

        // Announce, then stream. The size line tells the remote exactly how
        // many raw bytes follow before the next line.
        transport.send_line(&path).await?;
        transport.send_line(&unit.size().to_string()).await?;
        progress.file_started(&path, unit.size());

        let mut stream = unit.open().await?;
        let mut sent = 0u64;
        while let Some(chunk) = stream.next_chunk().await? {
            transport.send_chunk(&chunk).await?;
            sent += chunk.len() as u64;
            progress.chunk_sent(sent, unit.size());
        }
        progress.file_done();

        Ok(sent)
    }
}

/// Announce and send a completion marker under `path`. Markers are framed
/// exactly like files: path line, size line, one chunk.
pub async fn send_marker(transport: &mut dyn Transport, path: &str) -> Result<()> {
    transport.send_line(path).await?;
    transport
        .send_line(&MARKER_PAYLOAD.len().to_string())
        .await?;
    transport.send_chunk(MARKER_PAYLOAD).await?;
    Ok(())
}
