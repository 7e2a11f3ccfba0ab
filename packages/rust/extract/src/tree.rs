//! Tree fetch strategy.
//!
//! Used for branch-based releases: instead of unpacking a published archive,
//! the target directory is enumerated through the remote tree API and each
//! file is fetched by content-address. Directories are created up front;
//! file fetches fan out concurrently under a semaphore bound.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

use docport_shared::{
    DocportError, FileRecord, Release, Result, Transform, TransformContext,
};
use docport_source::TreeClient;

/// Fetch the subtree at `dir` from the remote tree into `cwd`.
///
/// Returns the relative paths written, in tree-listing order.
#[instrument(skip_all, fields(release = %release.id, dir))]
pub async fn extract_tree(
    release: &Release,
    cwd: &Path,
    dir: &str,
    tree: &TreeClient,
    concurrency: usize,
    transform: Arc<dyn Transform>,
) -> Result<Vec<FileRecord>> {
    let reference = release.resolved.as_deref().ok_or_else(|| {
        DocportError::validation(format!("release {} has no resolved ref", release.id))
    })?;

    // Resolve the target directory's content-address by listing its parent.
    let (parent, name) = dir.rsplit_once('/').unwrap_or(("", dir));
    let entries = tree.list_dir(parent, reference).await?;
    let dir_sha = entries
        .iter()
        .find(|e| e.name == name && e.kind == "dir")
        .map(|e| e.sha.clone())
        .ok_or_else(|| DocportError::SourceDirNotFound {
            release: release.id.clone(),
            tried: vec![dir.to_string()],
        })?;

    let files = tree.list_tree(&dir_sha).await?;
    debug!(sha = %dir_sha, files = files.len(), "enumerated source tree");

    // All directories must exist before any file in them is written.
    let mut dirs: BTreeSet<PathBuf> = BTreeSet::new();
    dirs.insert(cwd.to_path_buf());
    for f in &files {
        if let Some(p) = Path::new(&f.path).parent() {
            if p != Path::new("") {
                dirs.insert(cwd.join(p));
            }
        }
    }
    for d in &dirs {
        std::fs::create_dir_all(d).map_err(|e| DocportError::io(d, e))?;
    }

    // Bounded fan-out: one permit per in-flight blob fetch.
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let release = Arc::new(release.clone());
    let mut handles = Vec::with_capacity(files.len());

    for f in files {
        let sem = semaphore.clone();
        let tree = tree.clone();
        let transform = transform.clone();
        let release = release.clone();
        let target = cwd.join(&f.path);

        handles.push(tokio::spawn(async move {
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(|e| DocportError::validation(format!("fetch pool closed: {e}")))?;

            let bytes = tree.blob(&f.sha).await?;
            let ctx = TransformContext {
                release: &release,
                path: f.path.clone(),
                frontmatter: None,
            };
            let content = transform.apply(&bytes, &ctx)?;
            std::fs::write(&target, content).map_err(|e| DocportError::io(&target, e))?;

            Ok::<_, DocportError>(FileRecord {
                path: f.path,
                sha: Some(f.sha),
            })
        }));
    }

    let mut records = Vec::with_capacity(handles.len());
    for handle in handles {
        let record = handle
            .await
            .map_err(|e| DocportError::validation(format!("fetch task panicked: {e}")))??;
        records.push(record);
    }

    info!(files = records.len(), "tree fetch complete");
    Ok(records)
}
