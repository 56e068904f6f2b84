//! GitHub contents API client.
//!
//! Speaks the repository contents endpoint and nothing else: one request per
//! directory listing, one request per file read.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, trace};

use crate::entity::{EntityKind, RemoteEntity};
use crate::error::{RemoteError, Result};
use crate::RemoteTree;

/// GitHub API root.
const API_ROOT: &str = "https://api.github.com";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Configuration for [`GithubClient`].
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// User-Agent header. GitHub rejects requests without one.
    pub user_agent: String,
    /// Overall per-request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            user_agent: concat!("hubfs/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

/// Client for the GitHub contents API.
pub struct GithubClient {
    /// HTTP client.
    client: Client,
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GithubClient {
    /// Creates a new client with default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// practice).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&RemoteConfig::new())
    }

    /// Creates a new client with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// practice).
    #[must_use]
    pub fn with_config(config: &RemoteConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .expect("failed to create HTTP client");

        Self { client }
    }

    /// Builds the root directory entity for `repo` (`owner/name`).
    ///
    /// Purely local: the first network call happens when the root is first
    /// listed, not here.
    #[must_use]
    pub fn repo_root(repo: &str) -> RemoteEntity {
        RemoteEntity {
            name: String::new(),
            kind: EntityKind::Dir,
            download_url: None,
            url: format!("{API_ROOT}/repos/{repo}/contents"),
        }
    }

    /// Issues a single GET and returns the body on a success status.
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Unavailable(format!(
                "unexpected status fetching {url}: {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("failed to read response body: {e}")))?;

        trace!(url = %url, body_len = body.len(), "fetched");

        Ok(body.to_vec())
    }
}

#[async_trait]
impl RemoteTree for GithubClient {
    #[instrument(skip(self, entity), fields(name = %entity.name))]
    async fn list_children(&self, entity: &RemoteEntity) -> Result<Vec<RemoteEntity>> {
        if !entity.is_dir() {
            return Err(RemoteError::NotADirectory(entity.name.clone()));
        }

        debug!(url = %entity.url, "listing directory");

        let body = self.get(&entity.url).await?;
        let children: Vec<RemoteEntity> = serde_json::from_slice(&body)
            .map_err(|e| RemoteError::Unavailable(format!("malformed listing: {e}")))?;

        Ok(children)
    }

    #[instrument(skip(self, entity), fields(name = %entity.name))]
    async fn fetch_content(&self, entity: &RemoteEntity) -> Result<Vec<u8>> {
        if !entity.is_file() {
            return Err(RemoteError::NotAFile(entity.name.clone()));
        }

        let url = entity.download_url.as_ref().ok_or_else(|| {
            RemoteError::Unavailable(format!("no content locator for {}", entity.name))
        })?;

        debug!(url = %url, "fetching content");

        self.get(url).await
    }
}
