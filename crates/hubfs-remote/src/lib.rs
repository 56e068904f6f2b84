//! # hubfs-remote
//!
//! Remote tree access for hubfs.
//!
//! A mounted repository is just a tree of named entities reachable over
//! HTTP. This crate provides:
//!
//! - [`RemoteEntity`] / [`EntityKind`]: the wire model of the GitHub
//!   contents API
//! - [`RemoteTree`]: the interface the filesystem layer consumes
//! - [`GithubClient`]: the production [`RemoteTree`] implementation
//!
//! Every operation is a single round trip with no retry and no cache: a
//! mounted filesystem built on this client always reflects the live remote
//! tree, at the cost of one fetch per listing and per read.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod entity;
pub mod error;

pub use client::{GithubClient, RemoteConfig};
pub use entity::{EntityKind, RemoteEntity};
pub use error::{RemoteError, Result};

use async_trait::async_trait;

/// Interface to a remote tree of named entities.
///
/// The filesystem layer treats implementations as a black box that either
/// returns entities or fails; it never inspects locators.
#[async_trait]
pub trait RemoteTree: Send + Sync {
    /// Lists the children of a directory entity, in remote-response order.
    ///
    /// # Errors
    ///
    /// - [`RemoteError::NotADirectory`] if `entity` is not a directory
    /// - [`RemoteError::Unavailable`] if the listing cannot be fetched
    async fn list_children(&self, entity: &RemoteEntity) -> Result<Vec<RemoteEntity>>;

    /// Fetches the complete byte content of a file entity.
    ///
    /// # Errors
    ///
    /// - [`RemoteError::NotAFile`] if `entity` is not a file
    /// - [`RemoteError::Unavailable`] if the content cannot be fetched
    async fn fetch_content(&self, entity: &RemoteEntity) -> Result<Vec<u8>>;
}
