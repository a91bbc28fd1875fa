//! Error types for upsync.

use thiserror::Error;

/// Errors surfaced by configuration, repository and connection layers.
///
/// Protocol-level code uses `anyhow` and wraps these where a typed
/// distinction matters to the caller.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Unknown remote, unreadable profile, malformed remote URL.
    #[error("configuration error: {0}")]
    Config(String),

    /// Failure to open or maintain the remote connection.
    #[error("connection error: {source}")]
    Connection {
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
