//! FUSE dispatch binding.
//!
//! Translates `fuser` callbacks into node operations and errno replies. The
//! kernel addresses every operation after `lookup` by bare inode, so this
//! layer keeps the one piece of bookkeeping the protocol demands: which
//! entity each live inode refers to, refcounted by the kernel's
//! lookup/forget pairing. The table holds identity only; listings and
//! content are refetched on every call.

// Offsets, sizes and errnos cross between kernel integer types.
#![allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation
)]

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use fuser::{
    BackgroundSession, FileAttr, FileType, Filesystem, KernelConfig, MountOption, ReplyAttr,
    ReplyData, ReplyDirectory, ReplyEntry, ReplyOpen, Request,
};
use hubfs_remote::{RemoteEntity, RemoteError, RemoteTree};
use tokio::runtime::Handle;
use tracing::{debug, trace};

use crate::error::{FsError, Result};
use crate::inode::ROOT_INODE;
use crate::node::{DirEntry, DirNode, EntryType, FileNode, Node, NodeAttr};
use crate::FsConfig;

// ============================================================================
// Inode table
// ============================================================================

/// One live inode: the entity it names plus the kernel's outstanding lookup
/// count.
#[derive(Debug)]
struct NodeSlot {
    entity: RemoteEntity,
    nlookup: u64,
}

// ============================================================================
// Filesystem adapter
// ============================================================================

/// FUSE adapter serving a remote repository tree.
pub struct HubFs {
    /// Remote tree client.
    tree: Arc<dyn RemoteTree>,
    /// Root entity, built locally at construction time.
    root: RemoteEntity,
    /// Live inodes the kernel may still reference.
    nodes: HashMap<u64, NodeSlot>,
    /// Runtime handle driving the async client from the session thread.
    handle: Handle,
    /// Reply TTLs.
    config: FsConfig,
}

impl HubFs {
    /// Creates an adapter rooted at `root`.
    ///
    /// Purely local; the first remote call happens on the first kernel
    /// request that needs one. `handle` must belong to a runtime that
    /// outlives the mount session.
    #[must_use]
    pub fn new(tree: Arc<dyn RemoteTree>, root: RemoteEntity, handle: Handle) -> Self {
        Self::with_config(tree, root, handle, FsConfig::default())
    }

    /// Creates an adapter with explicit reply TTLs.
    #[must_use]
    pub fn with_config(
        tree: Arc<dyn RemoteTree>,
        root: RemoteEntity,
        handle: Handle,
        config: FsConfig,
    ) -> Self {
        Self {
            tree,
            root,
            nodes: HashMap::new(),
            handle,
            config,
        }
    }

    /// Resolves an inode to a node.
    fn node_for(&self, ino: u64) -> Result<Node> {
        if ino == ROOT_INODE {
            return Ok(Node::Directory(DirNode::new(self.root.clone(), ROOT_INODE)));
        }
        let slot = self.nodes.get(&ino).ok_or(FsError::InvalidInode(ino))?;
        Node::from_entity(slot.entity.clone(), ino).ok_or(FsError::InvalidInode(ino))
    }

    fn dir_for(&self, ino: u64) -> Result<DirNode> {
        match self.node_for(ino)? {
            Node::Directory(dir) => Ok(dir),
            Node::File(file) => Err(RemoteError::NotADirectory(file.entity.name).into()),
        }
    }

    fn file_for(&self, ino: u64) -> Result<FileNode> {
        match self.node_for(ino)? {
            Node::File(file) => Ok(file),
            Node::Directory(dir) => Err(RemoteError::NotAFile(dir.entity.name).into()),
        }
    }

    /// Records a kernel reference to `ino`, refreshing the stored entity.
    fn remember(&mut self, entity: RemoteEntity, ino: u64) {
        if ino == ROOT_INODE {
            return;
        }
        match self.nodes.entry(ino) {
            Entry::Occupied(mut slot) => {
                let slot = slot.get_mut();
                slot.nlookup += 1;
                slot.entity = entity;
            }
            Entry::Vacant(slot) => {
                slot.insert(NodeSlot { entity, nlookup: 1 });
            }
        }
    }

    // ========================================================================
    // Operation handlers
    // ========================================================================

    fn handle_lookup(&mut self, parent: u64, name: &str) -> Result<NodeAttr> {
        let dir = self.dir_for(parent)?;
        let node = self.handle.block_on(dir.lookup(self.tree.as_ref(), name))?;
        let attr = match &node {
            Node::Directory(child) => child.attributes(),
            Node::File(child) => self.handle.block_on(child.attributes(self.tree.as_ref()))?,
        };
        self.remember(node.entity().clone(), node.ino());
        Ok(attr)
    }

    fn handle_forget(&mut self, ino: u64, nlookup: u64) {
        if ino == ROOT_INODE {
            return;
        }
        if let Some(slot) = self.nodes.get_mut(&ino) {
            slot.nlookup = slot.nlookup.saturating_sub(nlookup);
            if slot.nlookup == 0 {
                self.nodes.remove(&ino);
            }
        }
    }

    fn handle_getattr(&self, ino: u64) -> Result<NodeAttr> {
        match self.node_for(ino)? {
            Node::Directory(dir) => Ok(dir.attributes()),
            Node::File(file) => self.handle.block_on(file.attributes(self.tree.as_ref())),
        }
    }

    fn handle_open(&self, ino: u64, flags: i32) -> Result<()> {
        self.file_for(ino)?.check_open(flags)
    }

    fn handle_read(&self, ino: u64, offset: u64, size: u32) -> Result<Vec<u8>> {
        let file = self.file_for(ino)?;
        self.handle.block_on(file.read(self.tree.as_ref(), offset, size))
    }

    fn handle_readdir(&self, ino: u64) -> Result<Vec<DirEntry>> {
        let dir = self.dir_for(ino)?;
        self.handle.block_on(dir.entries(self.tree.as_ref()))
    }
}

/// Builds the kernel-facing attr record from node attributes.
///
/// The kind tag goes through [`entry_file_type`], so attrs and dirents
/// always agree on how an entry type is presented.
fn attr_to_fuse(attr: &NodeAttr) -> FileAttr {
    let nlink = match attr.kind {
        EntryType::Directory => 2,
        EntryType::RegularFile | EntryType::Unknown => 1,
    };

    // The remote store carries no timestamps; everything reads as the epoch.
    FileAttr {
        ino: attr.ino,
        size: attr.size,
        blocks: attr.size.div_ceil(512),
        atime: SystemTime::UNIX_EPOCH,
        mtime: SystemTime::UNIX_EPOCH,
        ctime: SystemTime::UNIX_EPOCH,
        crtime: SystemTime::UNIX_EPOCH,
        kind: entry_file_type(attr.kind),
        perm: attr.perm,
        nlink,
        uid: 0,
        gid: 0,
        rdev: 0,
        blksize: 512,
        flags: 0,
    }
}

/// Maps an entry type tag to the dirent type `fuser` can carry.
///
/// `fuser` has no unknown dirent value, so unsupported entries are tagged as
/// symlinks, which is what they almost always are upstream. They still
/// refuse lookup.
fn entry_file_type(entry_type: EntryType) -> FileType {
    match entry_type {
        EntryType::Directory => FileType::Directory,
        EntryType::RegularFile => FileType::RegularFile,
        EntryType::Unknown => FileType::Symlink,
    }
}

impl Filesystem for HubFs {
    fn init(
        &mut self,
        _req: &Request<'_>,
        _config: &mut KernelConfig,
    ) -> std::result::Result<(), libc::c_int> {
        debug!(root = %self.root.url, "filesystem initialized");
        Ok(())
    }

    fn destroy(&mut self) {
        debug!("filesystem session ended");
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        // Remote names are unicode; anything else cannot exist here.
        let Some(name) = name.to_str() else {
            reply.error(libc::ENOENT);
            return;
        };
        trace!(parent, name, "lookup");

        match self.handle_lookup(parent, name) {
            Ok(attr) => reply.entry(&self.config.entry_ttl, &attr_to_fuse(&attr), 0),
            Err(err) => reply.error(err.to_errno()),
        }
    }

    fn forget(&mut self, _req: &Request<'_>, ino: u64, nlookup: u64) {
        trace!(ino, nlookup, "forget");
        self.handle_forget(ino, nlookup);
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        trace!(ino, "getattr");
        match self.handle_getattr(ino) {
            Ok(attr) => reply.attr(&self.config.attr_ttl, &attr_to_fuse(&attr)),
            Err(err) => reply.error(err.to_errno()),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        trace!(ino, flags, "open");
        match self.handle_open(ino, flags) {
            // Content is refetched per read, so the handle carries no state.
            Ok(()) => reply.opened(0, 0),
            Err(err) => reply.error(err.to_errno()),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        trace!(ino, offset, size, "read");
        match self.handle_read(ino, offset.max(0) as u64, size) {
            Ok(data) => reply.data(&data),
            Err(err) => reply.error(err.to_errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        trace!(ino, offset, "readdir");
        match self.handle_readdir(ino) {
            Ok(entries) => {
                for (i, entry) in entries.iter().enumerate().skip(offset.max(0) as usize) {
                    let full = reply.add(
                        entry.ino,
                        (i + 1) as i64,
                        entry_file_type(entry.entry_type),
                        &entry.name,
                    );
                    if full {
                        break;
                    }
                }
                reply.ok();
            }
            Err(err) => reply.error(err.to_errno()),
        }
    }
}

// ============================================================================
// Mounting
// ============================================================================

/// Mount options for a hubfs session.
#[derive(Debug, Clone)]
pub struct MountOptions {
    /// Filesystem name shown in mount tables.
    pub fsname: String,
    /// Allow other users to access the mount.
    pub allow_other: bool,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            fsname: "hubfs".to_string(),
            allow_other: false,
        }
    }
}

fn to_fuser_options(options: &MountOptions) -> Vec<MountOption> {
    let mut opts = vec![
        MountOption::FSName(options.fsname.clone()),
        MountOption::RO,
        MountOption::AutoUnmount,
        MountOption::DefaultPermissions,
    ];
    if options.allow_other {
        opts.push(MountOption::AllowOther);
    }
    opts
}

/// Mounts `fs` at `mountpoint` and blocks until the session ends.
///
/// # Errors
///
/// Returns an I/O error if the mount cannot be established.
pub fn mount(
    fs: HubFs,
    mountpoint: impl AsRef<Path>,
    options: &MountOptions,
) -> std::io::Result<()> {
    debug!(mountpoint = %mountpoint.as_ref().display(), "mounting");
    fuser::mount2(fs, mountpoint.as_ref(), &to_fuser_options(options))
}

/// Mounts `fs` on a background session thread.
///
/// The returned session unmounts when dropped.
///
/// # Errors
///
/// Returns an I/O error if the mount cannot be established.
pub fn spawn_mount(
    fs: HubFs,
    mountpoint: impl AsRef<Path>,
    options: &MountOptions,
) -> std::io::Result<BackgroundSession> {
    debug!(mountpoint = %mountpoint.as_ref().display(), "mounting in background");
    fuser::spawn_mount2(fs, mountpoint.as_ref(), &to_fuser_options(options))
}
