//! Filesystem nodes over remote entities.
//!
//! A node wraps exactly one [`RemoteEntity`] plus its assigned inode and is
//! built fresh for every kernel request that needs one; nothing survives
//! between requests. Directory and file behavior live in their own variants
//! with exhaustive matching at every dispatch point, so an unsupported
//! remote kind can never masquerade as a plain file.

// Offsets and sizes cross between u64/u32 kernel types and usize buffers.
#![allow(clippy::cast_possible_truncation)]

use hubfs_remote::{EntityKind, RemoteEntity, RemoteTree};

use crate::error::{FsError, Result};
use crate::inode::derive_inode;

/// Directory permission bits: read and execute for everyone, no write.
const DIR_PERM: u16 = 0o555;

/// File permission bits: read for everyone.
const FILE_PERM: u16 = 0o444;

// ============================================================================
// Entry and attribute types
// ============================================================================

/// Type tag reported for a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// Child directory.
    Directory,
    /// Regular file.
    RegularFile,
    /// Entity kind this filesystem cannot represent (symlink, submodule).
    /// Listed, but not openable.
    Unknown,
}

impl EntryType {
    fn from_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Dir => Self::Directory,
            EntityKind::File => Self::RegularFile,
            EntityKind::Unsupported => Self::Unknown,
        }
    }
}

/// A directory entry as `readdir` reports it.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Entry name.
    pub name: String,
    /// Derived inode.
    pub ino: u64,
    /// Type tag.
    pub entry_type: EntryType,
}

/// Node attributes, independent of the mount runtime's attr layout.
#[derive(Debug, Clone, Copy)]
pub struct NodeAttr {
    /// Inode.
    pub ino: u64,
    /// Directory or regular file.
    pub kind: EntryType,
    /// Content length in bytes; zero for directories.
    pub size: u64,
    /// Permission bits.
    pub perm: u16,
}

// ============================================================================
// Node variants
// ============================================================================

/// A filesystem node: one remote entity plus its inode.
#[derive(Debug, Clone)]
pub enum Node {
    /// Directory variant.
    Directory(DirNode),
    /// Regular file variant.
    File(FileNode),
}

impl Node {
    /// Converts an entity into the matching node variant.
    ///
    /// Returns `None` for unsupported kinds: those entries appear in
    /// listings but never become nodes.
    #[must_use]
    pub fn from_entity(entity: RemoteEntity, ino: u64) -> Option<Self> {
        match entity.kind {
            EntityKind::Dir => Some(Self::Directory(DirNode::new(entity, ino))),
            EntityKind::File => Some(Self::File(FileNode::new(entity, ino))),
            EntityKind::Unsupported => None,
        }
    }

    /// The assigned inode.
    #[must_use]
    pub const fn ino(&self) -> u64 {
        match self {
            Self::Directory(dir) => dir.ino,
            Self::File(file) => file.ino,
        }
    }

    /// The wrapped entity.
    #[must_use]
    pub const fn entity(&self) -> &RemoteEntity {
        match self {
            Self::Directory(dir) => &dir.entity,
            Self::File(file) => &file.entity,
        }
    }
}

/// Directory node.
#[derive(Debug, Clone)]
pub struct DirNode {
    /// The directory's remote entity.
    pub entity: RemoteEntity,
    /// Assigned inode.
    pub ino: u64,
}

impl DirNode {
    /// Creates a directory node.
    #[must_use]
    pub const fn new(entity: RemoteEntity, ino: u64) -> Self {
        Self { entity, ino }
    }

    /// Directory attributes. Pure local computation from the entity's type
    /// tag; never fails and never touches the network.
    #[must_use]
    pub const fn attributes(&self) -> NodeAttr {
        NodeAttr {
            ino: self.ino,
            kind: EntryType::Directory,
            size: 0,
            perm: DIR_PERM,
        }
    }

    /// Resolves `name` to a child node.
    ///
    /// Fetches the live child listing and scans it for an exact match. The
    /// child inode is derived from this node's inode and the name, exactly
    /// as [`entries`](Self::entries) derives it.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if no child has that name, or the match is
    ///   of an unsupported kind
    /// - [`FsError::Remote`] if the listing fetch fails
    pub async fn lookup(&self, tree: &dyn RemoteTree, name: &str) -> Result<Node> {
        let children = tree.list_children(&self.entity).await?;
        for child in children {
            if child.name == name {
                let ino = derive_inode(self.ino, name);
                return Node::from_entity(child, ino).ok_or_else(|| FsError::not_found(name));
            }
        }
        Err(FsError::not_found(name))
    }

    /// Lists this directory.
    ///
    /// Every child appears, including unsupported kinds (tagged
    /// [`EntryType::Unknown`]); inodes match what [`lookup`](Self::lookup)
    /// would assign the same names within this listing.
    ///
    /// # Errors
    ///
    /// - [`FsError::Remote`] if the listing fetch fails
    pub async fn entries(&self, tree: &dyn RemoteTree) -> Result<Vec<DirEntry>> {
        let children = tree.list_children(&self.entity).await?;
        Ok(children
            .into_iter()
            .map(|child| DirEntry {
                ino: derive_inode(self.ino, &child.name),
                entry_type: EntryType::from_kind(child.kind),
                name: child.name,
            })
            .collect())
    }
}

/// Regular file node.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// The file's remote entity.
    pub entity: RemoteEntity,
    /// Assigned inode.
    pub ino: u64,
}

impl FileNode {
    /// Creates a file node.
    #[must_use]
    pub const fn new(entity: RemoteEntity, ino: u64) -> Self {
        Self { entity, ino }
    }

    /// File attributes.
    ///
    /// The remote store exposes no cheap size metadata, so the size is the
    /// length of a fresh full content fetch.
    ///
    /// # Errors
    ///
    /// - [`FsError::Remote`] if the content fetch fails
    pub async fn attributes(&self, tree: &dyn RemoteTree) -> Result<NodeAttr> {
        let content = tree.fetch_content(&self.entity).await?;
        Ok(NodeAttr {
            ino: self.ino,
            kind: EntryType::RegularFile,
            size: content.len() as u64,
            perm: FILE_PERM,
        })
    }

    /// Validates open intent. The filesystem is permanently read-only, so
    /// only the access-mode bits matter.
    ///
    /// # Errors
    ///
    /// - [`FsError::AccessDenied`] for any access mode other than `O_RDONLY`
    pub fn check_open(&self, flags: i32) -> Result<()> {
        if flags & libc::O_ACCMODE == libc::O_RDONLY {
            Ok(())
        } else {
            Err(FsError::AccessDenied(self.entity.name.clone()))
        }
    }

    /// Reads up to `size` bytes at `offset`.
    ///
    /// Fetches the complete content and returns the requested range clamped
    /// to the actual length: short near the end, empty at or past it. An
    /// out-of-range offset is a zero-byte read, never an error.
    ///
    /// # Errors
    ///
    /// - [`FsError::Remote`] if the content fetch fails
    pub async fn read(&self, tree: &dyn RemoteTree, offset: u64, size: u32) -> Result<Vec<u8>> {
        let content = tree.fetch_content(&self.entity).await?;
        let len = content.len();
        let start = usize::try_from(offset).map_or(len, |off| off.min(len));
        let end = start.saturating_add(size as usize).min(len);
        Ok(content[start..end].to_vec())
    }
}
