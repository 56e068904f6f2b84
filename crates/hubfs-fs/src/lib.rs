//! # hubfs-fs
//!
//! Read-only FUSE filesystem over a remote repository tree.
//!
//! ## Features
//!
//! - **Stateless nodes**: listings and content are fetched on demand, never
//!   cached
//! - **Deterministic inodes**: derived by hashing `(parent inode, name)`, so
//!   repeated walks agree without an allocation table
//! - **Async bridge**: sync FUSE callbacks drive the async remote client
//!   through a runtime handle
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐     ┌───────┐     ┌────────────────┐     ┌────────────┐
//! │ kernel  │────▶│ fuser │────▶│ HubFs adapter  │────▶│ RemoteTree │
//! │ (VFS)   │◀────│       │◀────│ (inode table)  │◀────│ client     │
//! └─────────┘     └───────┘     └────────────────┘     └────────────┘
//!                                       │
//!                                       ▼
//!                               DirNode / FileNode
//! ```

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod fuse;
pub mod inode;
pub mod node;

pub use error::{FsError, Result};
pub use fuse::{mount, spawn_mount, HubFs, MountOptions};
pub use inode::{derive_inode, ROOT_INODE};
pub use node::{DirEntry, DirNode, EntryType, FileNode, Node, NodeAttr};

use std::time::Duration;

/// Filesystem configuration.
#[derive(Debug, Clone)]
pub struct FsConfig {
    /// How long the kernel may cache entry replies.
    pub entry_ttl: Duration,
    /// How long the kernel may cache attribute replies.
    pub attr_ttl: Duration,
}

impl FsConfig {
    /// Creates a configuration with one-second kernel caching.
    ///
    /// Short TTLs keep the view close to the remote tree without a refetch
    /// on every stat.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entry_ttl: Duration::from_secs(1),
            attr_ttl: Duration::from_secs(1),
        }
    }
}

impl Default for FsConfig {
    fn default() -> Self {
        Self::new()
    }
}
