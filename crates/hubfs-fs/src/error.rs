//! Error types for filesystem operations.

use hubfs_remote::RemoteError;
use thiserror::Error;

/// Result type alias for filesystem operations.
pub type Result<T> = std::result::Result<T, FsError>;

/// Errors that can occur during filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// Failure reported by the remote tree client.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A requested child name does not exist in the current listing, or
    /// names an entity this filesystem cannot represent.
    #[error("no such entry: {0}")]
    NotFound(String),

    /// An open with non-read-only intent.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The kernel referenced an inode that is no longer known.
    #[error("invalid inode: {0}")]
    InvalidInode(u64),
}

impl FsError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Converts the error to a POSIX errno.
    ///
    /// Type-mismatch failures from the remote layer map to `EIO`: they mark
    /// a contract violation between hubfs layers, not a path-type mistake
    /// the kernel could act on.
    #[must_use]
    pub const fn to_errno(&self) -> i32 {
        match self {
            Self::Remote(
                RemoteError::Unavailable(_)
                | RemoteError::NotADirectory(_)
                | RemoteError::NotAFile(_),
            ) => libc::EIO,
            Self::NotFound(_) => libc::ENOENT,
            Self::AccessDenied(_) => libc::EACCES,
            Self::InvalidInode(_) => libc::EBADF,
        }
    }
}
