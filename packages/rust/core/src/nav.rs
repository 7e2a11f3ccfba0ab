//! Navigation description parsing and release-scoped URL rewriting.
//!
//! The navigation description is a human-authored YAML sequence of nodes.
//! Building a release's navigation rewrites every node's url, recursively,
//! to `release.base_url() + original` without changing the tree's shape.

use tracing::{debug, instrument};

use docport_shared::{DocportError, NavNode, Release, Result};
use docport_source::TreeClient;

/// Candidate locations of the navigation description, probed in order.
pub const NAV_CANDIDATES: [&str; 2] = ["docs/nav.yml", "docs/content/nav.yml"];

/// A release's rewritten navigation plus the repo path it was built from.
#[derive(Debug, Clone)]
pub struct ReleaseNav {
    /// Repo path of the navigation description used.
    pub path: String,
    /// Top-level sections with release-absolute urls.
    pub children: Vec<NavNode>,
}

/// Parse a YAML navigation description.
pub fn parse_nav(yaml: &str) -> Result<Vec<NavNode>> {
    serde_yaml::from_str(yaml)
        .map_err(|e| DocportError::parse(format!("navigation description: {e}")))
}

/// Rewrite every node's url to be release-absolute.
///
/// Pure recursive function over the input tree; child ordering, counts, and
/// empty child lists are preserved exactly.
pub fn rewrite_urls(nodes: &[NavNode], base: &str) -> Vec<NavNode> {
    nodes
        .iter()
        .map(|node| NavNode {
            title: node.title.clone(),
            url: format!("{base}{}", node.url),
            shortname: node.shortname.clone(),
            description: node.description.clone(),
            children: rewrite_urls(&node.children, base),
        })
        .collect()
}

/// Fetch, parse, and rewrite the navigation description for a release.
#[instrument(skip_all, fields(release = %release.id))]
pub async fn build_nav(release: &Release, tree: &TreeClient) -> Result<ReleaseNav> {
    let reference = release.resolved.as_deref().ok_or_else(|| {
        DocportError::validation(format!("release {} has no resolved ref", release.id))
    })?;

    for candidate in NAV_CANDIDATES {
        if tree.path_exists(candidate, reference).await? {
            let content = tree.file(candidate, reference).await?;
            let nodes = parse_nav(&content)?;
            debug!(path = candidate, sections = nodes.len(), "navigation built");
            return Ok(ReleaseNav {
                path: candidate.to_string(),
                children: rewrite_urls(&nodes, &release.base_url()),
            });
        }
    }

    Err(DocportError::validation(format!(
        "no navigation description found for {} (tried {NAV_CANDIDATES:?})",
        release.id
    )))
}
