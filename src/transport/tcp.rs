//! TCP transport.
//!
//! Opens the connection and presents the resolved credential as the very
//! first line on the wire (an empty line when no credential applies);
//! whether an absent credential is acceptable is the remote's decision.
//! No timeouts are imposed here: a stalled remote blocks the push until
//! the OS gives up.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{
    tcp::{OwnedReadHalf, OwnedWriteHalf},
    TcpStream,
};
use tracing::debug;

use crate::error::SyncError;
use crate::transport::Transport;

/// Line-and-chunk transport over one TCP connection.
pub struct TcpTransport {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TcpTransport {
    /// Connect to `host:port` and present `key`.
    pub async fn connect(host: &str, port: u16, key: &str) -> crate::error::Result<Self> {
        debug!(host, port, "connecting");
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| SyncError::Connection { source })?;
        let (read_half, write_half) = stream.into_split();

        let mut transport = Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        };
        transport
            .send_line(key)
            .await
            .map_err(|e| SyncError::Connection {
                source: std::io::Error::other(e.to_string()),
            })?;
        Ok(transport)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send_line(&mut self, line: &str) -> Result<()> {
        debug_assert!(!line.contains('\n'));
        self.writer
            .write_all(line.as_bytes())
            .await
            .context("failed to send line")?;
        self.writer
            .write_all(b"\n")
            .await
            .context("failed to send line terminator")?;
        self.writer.flush().await.context("failed to flush line")?;
        Ok(())
    }

    async fn recv_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .await
            .context("failed to read response line")?;
        if n == 0 {
            anyhow::bail!("connection closed by remote");
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    async fn send_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.writer
            .write_all(chunk)
            .await
            .context("failed to send chunk")?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .context("failed to flush connection")?;
        self.writer
            .shutdown()
            .await
            .context("failed to close connection")?;
        debug!("connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn connect_presents_credential_line() -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            line
        });

        let mut transport = TcpTransport::connect(&addr.ip().to_string(), addr.port(), "k-42")
            .await
            .unwrap();
        transport.close().await?;

        assert_eq!(server.await?, "k-42\n");
        Ok(())
    }

    #[tokio::test]
    async fn lines_and_chunks_arrive_in_order() -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut stream = stream;
            stream.read_to_end(&mut buf).await.unwrap();
            buf
        });

        let mut transport = TcpTransport::connect(&addr.ip().to_string(), addr.port(), "")
            .await
            .unwrap();
        transport.send_line("proj/a.txt").await?;
        transport.send_chunk(&[1, 2, 3]).await?;
        transport.close().await?;

        assert_eq!(server.await?, b"\nproj/a.txt\n\x01\x02\x03");
        Ok(())
    }

    #[tokio::test]
    async fn connect_failure_is_connection_error() {
        // Port 1 on localhost is essentially never listening.
        let err = TcpTransport::connect("127.0.0.1", 1, "").await.err();
        assert!(matches!(err, Some(SyncError::Connection { .. })));
    }
}
