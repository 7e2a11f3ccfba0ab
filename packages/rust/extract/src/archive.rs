//! Archive extraction strategy.
//!
//! Streams the release's packaged archive, keeps only the entries under the
//! target directory, strips the leading wrapper segment plus the target
//! directory itself, and writes each surviving entry through the content
//! transform. Entries are processed in stream order; a tar or gzip failure
//! aborts the whole run.

use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{debug, info, instrument};

use docport_shared::{
    DocportError, FileRecord, Release, Result, Transform, TransformContext,
};

/// Extract the subtree at `dir` from the release's archive into `cwd`.
///
/// Returns the relative paths written, in stream order.
#[instrument(skip_all, fields(release = %release.id, dir))]
pub async fn extract_archive(
    release: &Release,
    cwd: &Path,
    dir: &str,
    transform: &dyn Transform,
) -> Result<Vec<FileRecord>> {
    let spec = release.spec.as_deref().ok_or_else(|| {
        DocportError::validation(format!("release {} has no archive spec", release.id))
    })?;

    let bytes = docport_source::fetch_archive(spec).await?;
    let records = unpack(release, cwd, dir, &bytes, transform)?;

    info!(files = records.len(), "archive extraction complete");
    Ok(records)
}

/// Unpack an in-memory gzipped tarball. Split out from the fetch so tests
/// can exercise the filter without a server.
fn unpack(
    release: &Release,
    cwd: &Path,
    dir: &str,
    bytes: &[u8],
    transform: &dyn Transform,
) -> Result<Vec<FileRecord>> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    let mut records = Vec::new();

    let entries = archive
        .entries()
        .map_err(|e| DocportError::StreamExtraction(e.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| DocportError::StreamExtraction(e.to_string()))?;

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let entry_path = entry
            .path()
            .map_err(|e| DocportError::StreamExtraction(e.to_string()))?
            .to_string_lossy()
            .into_owned();

        let Some(rel) = strip_target_dir(&entry_path, dir) else {
            debug!(path = %entry_path, "outside target dir, skipping");
            continue;
        };

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .map_err(|e| DocportError::StreamExtraction(format!("{entry_path}: {e}")))?;

        let ctx = TransformContext {
            release,
            path: rel.clone(),
            frontmatter: None,
        };
        let content = transform.apply(&buf, &ctx)?;

        let target = cwd.join(&rel);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocportError::io(parent, e))?;
        }
        std::fs::write(&target, content).map_err(|e| DocportError::io(&target, e))?;

        records.push(FileRecord {
            path: rel,
            sha: None,
        });
    }

    Ok(records)
}

/// Map an archive entry path to its output-relative path, or `None` when the
/// entry falls outside the target directory.
///
/// The first segment is the archive's conventional top-level wrapper (e.g.
/// `pkg-1.0.0/`); the segments after it must equal `dir` component-wise, and
/// whatever remains is the output path.
fn strip_target_dir(entry_path: &str, dir: &str) -> Option<String> {
    let mut segments = entry_path.split('/').filter(|s| !s.is_empty());
    // One leading wrapper segment, always present in packaged archives.
    segments.next()?;

    for want in dir.split('/').filter(|s| !s.is_empty()) {
        if segments.next()? != want {
            return None;
        }
    }

    let rest: Vec<&str> = segments.collect();
    if rest.is_empty() {
        return None;
    }
    Some(rest.join("/"))
}
