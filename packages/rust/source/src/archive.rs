//! Packaged archive download.
//!
//! The archive is consumed as one continuous byte stream: either the whole
//! body arrives or the fetch fails, and extraction operates on the delivered
//! bytes. End-of-stream and stream error are the only terminal signals.

use reqwest::Client;
use tracing::debug;

use docport_shared::{DocportError, Result};

use crate::USER_AGENT;

/// Download the gzipped archive at `url` and return its bytes.
pub async fn fetch_archive(url: &str) -> Result<Vec<u8>> {
    let http = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .map_err(|e| DocportError::Network(format!("failed to build HTTP client: {e}")))?;

    let resp = http
        .get(url)
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
        .map_err(|e| DocportError::StreamExtraction(format!("{url}: {e}")))?;

    debug!(url, size = bytes.len(), "archive downloaded");
    Ok(bytes.to_vec())
}
