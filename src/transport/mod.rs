//! Remote connection abstraction.
//!
//! The push protocol needs exactly three primitives from a connection:
//! send a newline-terminated text line, receive one text-line response,
//! and send a raw binary chunk (no response expected). The `Transport`
//! trait captures those; `TcpTransport` implements them over a TCP
//! stream. Protocol sequencing lives in `crate::push`, not here.

pub mod tcp;

pub use tcp::TcpTransport;

use anyhow::Result;
use async_trait::async_trait;

/// A single-owner, ordered, bidirectional byte stream to the remote.
///
/// Lines are UTF-8, terminated by `\n`; the terminator is stripped on
/// receive. Chunk sends are fire-and-forget: the remote never acknowledges
/// them in-band.
#[async_trait]
pub trait Transport: Send {
    /// Send one text line. `line` must not contain `\n`.
    async fn send_line(&mut self, line: &str) -> Result<()>;

    /// Receive one text line, without its terminator.
    async fn recv_line(&mut self) -> Result<String>;

    /// Send a raw binary chunk.
    async fn send_chunk(&mut self, chunk: &[u8]) -> Result<()>;

    /// Close the connection. Must be called on every exit path once the
    /// connection was opened.
    async fn close(&mut self) -> Result<()>;
}
