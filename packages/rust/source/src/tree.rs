//! Remote tree API client.
//!
//! Speaks a GitHub-style REST surface: branch resolution, directory listing,
//! recursive tree listing, raw blob fetch, and path existence probes. The
//! base URL is configurable so tests can point it at a mock server.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use docport_shared::{DocportError, Result};

use crate::USER_AGENT;

/// Accept header value that makes contents/blob endpoints return raw bytes.
const RAW_ACCEPT: &str = "application/vnd.github.raw+json";

/// One entry from a directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct DirEntry {
    /// Entry name (final path segment).
    pub name: String,
    /// Content-address of the entry.
    pub sha: String,
    /// `file` or `dir`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// One blob from a recursive tree listing.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the listed tree.
    pub path: String,
    /// Blob content-address.
    pub sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<RawTreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct RawTreeEntry {
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Client for the remote source-control tree API.
#[derive(Debug, Clone)]
pub struct TreeClient {
    http: Client,
    api_base: String,
    repo: String,
}

impl TreeClient {
    /// Create a client for `repo` (`owner/name`) against `api_base`.
    pub fn new(api_base: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        let api_base = api_base.into();
        url::Url::parse(&api_base)
            .map_err(|e| DocportError::config(format!("invalid tree API base {api_base:?}: {e}")))?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| DocportError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo: repo.into(),
        })
    }

    /// Resolve the latest commit id on `branch`.
    pub async fn resolve_branch(&self, branch: &str) -> Result<String> {
        let url = format!("{}/repos/{}/commits/{branch}", self.api_base, self.repo);
        let resp: CommitResponse = self.get_json(&url).await?;
        debug!(branch, sha = %resp.sha, "resolved branch");
        Ok(resp.sha)
    }

    /// List the entries of a directory at `reference`.
    pub async fn list_dir(&self, path: &str, reference: &str) -> Result<Vec<DirEntry>> {
        let url = format!(
            "{}/repos/{}/contents/{path}?ref={reference}",
            self.api_base, self.repo
        );
        self.get_json(&url).await
    }

    /// Recursively list every file under the tree at `sha`.
    pub async fn list_tree(&self, sha: &str) -> Result<Vec<TreeEntry>> {
        let url = format!(
            "{}/repos/{}/git/trees/{sha}?recursive=1",
            self.api_base, self.repo
        );
        let resp: TreeResponse = self.get_json(&url).await?;

        if resp.truncated {
            return Err(DocportError::Network(format!(
                "tree listing for {sha} was truncated by the server"
            )));
        }

        Ok(resp
            .tree
            .into_iter()
            .filter(|e| e.kind == "blob")
            .map(|e| TreeEntry {
                path: e.path,
                sha: e.sha,
            })
            .collect())
    }

    /// Fetch the raw bytes of the blob at `sha`.
    pub async fn blob(&self, sha: &str) -> Result<Vec<u8>> {
        let url = format!("{}/repos/{}/git/blobs/{sha}", self.api_base, self.repo);
        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, RAW_ACCEPT)
            .send()
            .await
            .map_err(|e| DocportError::Network(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DocportError::Network(format!("{url}: HTTP {status}")));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| DocportError::Network(format!("{url}: body read failed: {e}")))?;
        Ok(bytes.to_vec())
    }

    /// Fetch the raw content of the file at `path` at `reference`.
    pub async fn file(&self, path: &str, reference: &str) -> Result<String> {
        let url = format!(
            "{}/repos/{}/contents/{path}?ref={reference}",
            self.api_base, self.repo
        );
        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, RAW_ACCEPT)
            .send()
            .await
            .map_err(|e| DocportError::Network(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DocportError::Network(format!("{url}: HTTP {status}")));
        }

        resp.text()
            .await
            .map_err(|e| DocportError::Network(format!("{url}: body read failed: {e}")))
    }

    /// Check whether `path` exists at `reference`. 404 → false.
    pub async fn path_exists(&self, path: &str, reference: &str) -> Result<bool> {
        let url = format!(
            "{}/repos/{}/contents/{path}?ref={reference}",
            self.api_base, self.repo
        );
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DocportError::Network(format!("{url}: {e}")))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(DocportError::Network(format!("{url}: HTTP {status}"))),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| DocportError::Network(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DocportError::Network(format!("{url}: HTTP {status}")));
        }

        resp.json()
            .await
            .map_err(|e| DocportError::parse(format!("{url}: {e}")))
    }
}
