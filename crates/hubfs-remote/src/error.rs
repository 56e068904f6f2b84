//! Error types for remote tree operations.

use thiserror::Error;

/// Result type alias for remote tree operations.
pub type Result<T> = std::result::Result<T, RemoteError>;

/// Errors that can occur while talking to the remote tree.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The remote store could not be reached or returned an unusable
    /// response (transport failure, non-success status, malformed payload).
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// Children were requested of an entity that is not a directory.
    #[error("entity is not a directory: {0}")]
    NotADirectory(String),

    /// Content was requested of an entity that is not a file.
    #[error("entity is not a file: {0}")]
    NotAFile(String),
}

impl RemoteError {
    /// Returns true if this is an availability failure rather than a
    /// caller-side contract violation.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
