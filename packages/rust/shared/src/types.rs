//! Core domain types for release documentation imports.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DocportError, Result};

/// File name of the import lock at the root of the content tree.
pub const LOCK_FILE_NAME: &str = "releases.lock.json";

// ---------------------------------------------------------------------------
// Release
// ---------------------------------------------------------------------------

/// One versioned instance of the documented package.
///
/// `resolved`, `spec`, and `src` start out empty and are populated by the
/// resolver and orchestrator during an import run. When `use_branch` is set,
/// `resolved` comes from branch resolution and `spec` stays `None`; otherwise
/// both come from the registry manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// Stable identifier, also the output directory name (e.g. `v2`).
    pub id: String,
    /// Package version this release documents.
    pub version: String,
    /// Source-control branch for branch-based releases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Selects tree fetching (true) vs archive extraction (false).
    #[serde(default)]
    pub use_branch: bool,
    /// Prereleases are skipped unless the caller opts in.
    #[serde(default)]
    pub prerelease: bool,
    /// Site-relative base path segment (e.g. `v2`).
    pub url_prefix: String,
    /// Content-address of the exact source snapshot (commit id or similar).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
    /// Archive fetch URL, derived from the registry manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    /// Repo path containing the documentation sources, resolved lazily.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

impl Release {
    /// Site-relative base URL for this release's pages.
    pub fn base_url(&self) -> String {
        format!("/{}", self.url_prefix)
    }
}

// ---------------------------------------------------------------------------
// NavNode
// ---------------------------------------------------------------------------

/// A node in the navigation tree.
///
/// Deserialized from the human-authored YAML navigation description. Empty
/// child lists are preserved as empty and skipped on serialization, never
/// coerced to a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavNode {
    /// Display title.
    pub title: String,
    /// Site-relative link; release-absolute after the nav rewrite.
    pub url: String,
    /// Short name used in breadcrumbs and index frontmatter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortname: Option<String>,
    /// Optional one-line description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Nested child nodes (ordered, recursive).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavNode>,
}

impl NavNode {
    /// The final path segment of this node's url.
    pub fn url_basename(&self) -> &str {
        self.url.trim_end_matches('/').rsplit('/').next().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// FileRecord
// ---------------------------------------------------------------------------

/// An extracted file, relative to the release's content root.
///
/// Ephemeral: consumed for logging and index derivation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path relative to the release output directory.
    pub path: String,
    /// Source-control blob id (tree fetch only).
    pub sha: Option<String>,
}

/// The distinct output directories implied by a set of extracted files:
/// the root (`""`) plus every directory containing a file.
pub fn output_dirs(files: &[FileRecord]) -> Vec<String> {
    let mut dirs = std::collections::BTreeSet::new();
    dirs.insert(String::new());
    for f in files {
        if let Some(parent) = Path::new(&f.path).parent() {
            let parent = parent.to_string_lossy();
            if !parent.is_empty() {
                dirs.insert(parent.into_owned());
            }
        }
    }
    dirs.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Registry manifest
// ---------------------------------------------------------------------------

/// The subset of a registry package manifest the resolver needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Published version string.
    pub version: String,
    /// Commit id the published package was built from.
    #[serde(rename = "gitHead", default, skip_serializing_if = "Option::is_none")]
    pub git_head: Option<String>,
    /// Distribution info.
    pub dist: Dist,
}

/// Distribution block of a registry manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dist {
    /// Archive fetch URL.
    pub tarball: String,
}

// ---------------------------------------------------------------------------
// Import lock
// ---------------------------------------------------------------------------

/// One recorded import in the lock file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockEntry {
    /// Content-address of the last successfully imported snapshot.
    pub resolved: String,
    /// When that import completed.
    pub imported_at: DateTime<Utc>,
}

/// `releases.lock.json` — release id → last successful import.
///
/// This is where the "previously recorded resolved identifier" used for
/// change detection lives between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportLock {
    /// Recorded imports, keyed by release id.
    #[serde(default)]
    pub releases: BTreeMap<String, LockEntry>,
}

impl ImportLock {
    /// Load the lock file under `content_root`. Missing file → empty lock.
    pub fn load(content_root: &Path) -> Result<Self> {
        let path = content_root.join(LOCK_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(&path).map_err(|e| DocportError::io(&path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| DocportError::parse(format!("invalid {LOCK_FILE_NAME}: {e}")))
    }

    /// Write the lock file under `content_root`.
    pub fn save(&self, content_root: &Path) -> Result<()> {
        let path = content_root.join(LOCK_FILE_NAME);
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| DocportError::validation(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| DocportError::io(&path, e))
    }

    /// The recorded content-address for a release, if any.
    pub fn resolved(&self, release_id: &str) -> Option<&str> {
        self.releases.get(release_id).map(|e| e.resolved.as_str())
    }

    /// Record a successful import.
    pub fn record(&mut self, release_id: &str, resolved: &str) {
        self.releases.insert(
            release_id.to_string(),
            LockEntry {
                resolved: resolved.to_string(),
                imported_at: Utc::now(),
            },
        );
    }
}
