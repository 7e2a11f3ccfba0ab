//! Release content extraction for docport.
//!
//! Two mutually exclusive strategies produce the same result shape: a list of
//! relative paths written under the release's output directory. Which one
//! runs is decided once per release by `use_branch`, keeping the orchestrator
//! strategy-agnostic.

pub mod archive;
pub mod tree;

use std::path::Path;
use std::sync::Arc;

use docport_shared::{FileRecord, Release, Result, Transform};
use docport_source::TreeClient;

pub use archive::extract_archive;
pub use tree::extract_tree;

/// The closed set of extraction strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Unpack the published archive (non-branch releases).
    Archive,
    /// Fetch files through the remote tree API (branch-based releases).
    Tree,
}

impl Strategy {
    /// Select the strategy for a release.
    pub fn for_release(release: &Release) -> Self {
        if release.use_branch {
            Self::Tree
        } else {
            Self::Archive
        }
    }
}

/// Strategy-dispatching extractor handed to the orchestrator.
#[derive(Clone)]
pub struct Extractor {
    /// Tree API client, used by the tree strategy.
    pub tree: TreeClient,
    /// Bound on simultaneous in-flight blob fetches.
    pub fetch_concurrency: usize,
}

impl Extractor {
    /// Extract the subtree at `dir` for `release` into `cwd` using the
    /// strategy its `use_branch` flag selects.
    pub async fn extract(
        &self,
        release: &Release,
        cwd: &Path,
        dir: &str,
        transform: &Arc<dyn Transform>,
    ) -> Result<Vec<FileRecord>> {
        match Strategy::for_release(release) {
            Strategy::Archive => extract_archive(release, cwd, dir, transform.as_ref()).await,
            Strategy::Tree => {
                extract_tree(
                    release,
                    cwd,
                    dir,
                    &self.tree,
                    self.fetch_concurrency,
                    transform.clone(),
                )
                .await
            }
        }
    }
}
