//! Package registry client.
//!
//! Fetches the published manifest for an exact package version; the resolver
//! derives the content-address and archive fetch URL from it.

use reqwest::Client;
use tracing::debug;

use docport_shared::{DocportError, Manifest, Result};

use crate::USER_AGENT;

/// Client for the package registry.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: Client,
    base: String,
}

impl RegistryClient {
    /// Create a client against `base` (e.g. `https://registry.npmjs.org`).
    pub fn new(base: impl Into<String>) -> Result<Self> {
        let base = base.into();
        url::Url::parse(&base)
            .map_err(|e| DocportError::config(format!("invalid registry base {base:?}: {e}")))?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| DocportError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the manifest for `package` at exactly `version`.
    pub async fn manifest(&self, package: &str, version: &str) -> Result<Manifest> {
        let url = format!("{}/{package}/{version}", self.base);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DocportError::Network(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DocportError::Network(format!("{url}: HTTP {status}")));
        }

        let manifest: Manifest = resp
            .json()
            .await
            .map_err(|e| DocportError::parse(format!("{url}: {e}")))?;

        debug!(package, version, git_head = ?manifest.git_head, "fetched manifest");
        Ok(manifest)
    }
}
