//! End-to-end release import pipeline:
//! resolve → clean output → locate sources → navigation → extract → indexes → changelog.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use docport_shared::{
    DocportError, NavNode, Release, Result, Transform, output_dirs,
};
use docport_source::{RegistryClient, TreeClient};
use docport_extract::Extractor;

use crate::changelog::merge_changelog;
use crate::index::write_indexes;
use crate::nav::{build_nav, parse_nav};
use crate::resolver::{Resolution, ResolveOptions, resolve};

/// Candidate repo paths holding the documentation sources, probed in order.
pub const SRC_CANDIDATES: [&str; 2] = ["docs/lib/content", "docs/content"];

/// Configuration for one release import.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Root of the site content tree.
    pub content_root: PathBuf,
    /// Site base navigation file, relative to `content_root`.
    pub base_nav: String,
    /// Package name in the registry.
    pub package: String,
    /// Bound on simultaneous in-flight file fetches (tree strategy).
    pub fetch_concurrency: usize,
}

/// Result of one successful release import.
#[derive(Debug)]
pub struct ImportResult {
    /// The release with its resolution fields populated.
    pub release: Release,
    /// The release's final navigation sections, changelog leaf included.
    pub nav: Vec<NavNode>,
    /// Number of content files extracted.
    pub files_written: usize,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once extraction has produced its file list.
    fn files_extracted(&self, count: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &ImportResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn files_extracted(&self, _count: usize) {}
    fn done(&self, _result: &ImportResult) {}
}

/// Import one release into the content tree.
///
/// Returns `Ok(None)` when the resolver decides there is nothing to do
/// (prerelease without opt-in, or unchanged since `previous`). The skip
/// decision is made before anything touches the output directory; once past
/// it, the release's directory is recreated from scratch, so a run is never
/// additive over stale content.
#[instrument(skip_all, fields(release = %release.id))]
pub async fn import_release(
    config: &ImportConfig,
    release: &Release,
    previous: Option<&str>,
    opts: ResolveOptions,
    tree: &TreeClient,
    registry: &RegistryClient,
    transform: Arc<dyn Transform>,
    progress: &dyn ProgressReporter,
) -> Result<Option<ImportResult>> {
    let start = Instant::now();

    // --- Phase 1: Resolve ---
    progress.phase("Resolving release");
    let mut release = match resolve(release, previous, opts, tree, registry, &config.package)
        .await?
    {
        Resolution::Skip(reason) => {
            info!(%reason, "skipping release");
            return Ok(None);
        }
        Resolution::Ready(release) => release,
    };
    let reference = release.resolved.clone().ok_or_else(|| {
        DocportError::validation(format!("release {} has no resolved ref", release.id))
    })?;

    info!(version = %release.version, resolved = %reference, "importing release");

    // --- Phase 2: Clean output directory ---
    progress.phase("Preparing output directory");
    let out = config.content_root.join(&release.id);
    if out.exists() {
        std::fs::remove_dir_all(&out).map_err(|e| DocportError::io(&out, e))?;
    }
    std::fs::create_dir_all(&out).map_err(|e| DocportError::io(&out, e))?;

    // --- Phase 3: Locate documentation sources ---
    progress.phase("Locating documentation sources");
    let mut src = None;
    for candidate in SRC_CANDIDATES {
        if tree.path_exists(candidate, &reference).await? {
            src = Some(candidate.to_string());
            break;
        }
    }
    let src = src.ok_or_else(|| DocportError::SourceDirNotFound {
        release: release.id.clone(),
        tried: SRC_CANDIDATES.iter().map(|s| s.to_string()).collect(),
    })?;
    release.src = Some(src.clone());

    // --- Phase 4: Build navigation ---
    progress.phase("Building navigation");
    let mut nav = build_nav(&release, tree).await?;

    // --- Phase 5: Extract content ---
    progress.phase("Extracting content");
    let extractor = Extractor {
        tree: tree.clone(),
        fetch_concurrency: config.fetch_concurrency,
    };
    let files = extractor.extract(&release, &out, &src, &transform).await?;
    progress.files_extracted(files.len());

    // --- Phase 6: Index pages ---
    progress.phase("Writing index pages");
    let base_nav_path = config.content_root.join(&config.base_nav);
    let base_nav_content = std::fs::read_to_string(&base_nav_path)
        .map_err(|e| DocportError::io(&base_nav_path, e))?;
    let base_nav = parse_nav(&base_nav_content)?;

    let dirs = output_dirs(&files);
    write_indexes(&release, &nav, &base_nav, &out, &dirs, transform.as_ref())?;

    // --- Phase 7: Changelog ---
    // Runs last: it mutates the navigation after the index pass has taken
    // its view of the child counts.
    progress.phase("Merging changelog");
    merge_changelog(&release, tree, &out, &mut nav.children, transform.as_ref()).await?;

    let result = ImportResult {
        release,
        nav: nav.children,
        files_written: files.len(),
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        files = result.files_written,
        elapsed_ms = result.elapsed.as_millis(),
        "release import complete"
    );

    Ok(Some(result))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use docport_shared::FrontmatterTransform;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NAV_YAML: &str = "- title: Guide\n  url: /guide\n  shortname: guide\n";
    const BASE_NAV_YAML: &str = "- title: Version 1\n  url: /v1\n";

    fn tarball(entries: &[(&str, &str)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (entry_path, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, entry_path, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn archive_release() -> Release {
        Release {
            id: "v1".into(),
            version: "1.0.0".into(),
            branch: None,
            use_branch: false,
            prerelease: false,
            url_prefix: "v1".into(),
            resolved: None,
            spec: None,
            src: None,
        }
    }

    fn branch_release() -> Release {
        Release {
            id: "v1".into(),
            version: "1.1.0".into(),
            branch: Some("release/v1".into()),
            use_branch: true,
            prerelease: false,
            url_prefix: "v1".into(),
            resolved: None,
            spec: None,
            src: None,
        }
    }

    fn config(content_root: &std::path::Path) -> ImportConfig {
        std::fs::write(content_root.join("nav.yml"), BASE_NAV_YAML).unwrap();
        ImportConfig {
            content_root: content_root.to_path_buf(),
            base_nav: "nav.yml".into(),
            package: "pkg".into(),
            fetch_concurrency: 4,
        }
    }

    /// Mocks shared by both strategies: source dir probes, nav, changelog.
    async fn mount_repo_fixture(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/repos/example/pkg/contents/docs/lib/content"))
            .respond_with(ResponseTemplate::new(404))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/example/pkg/contents/docs/content"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/example/pkg/contents/docs/nav.yml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(NAV_YAML))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/example/pkg/contents/CHANGELOG.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("## 1.0.0\n\nfoo>bar\n"))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn archive_import_end_to_end() {
        let server = MockServer::start().await;
        mount_repo_fixture(&server).await;

        Mock::given(method("GET"))
            .and(path("/pkg/1.0.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": "1.0.0",
                "gitHead": "abc123",
                "dist": {"tarball": format!("{}/pkg-1.0.0.tgz", server.uri())}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pkg-1.0.0.tgz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(tarball(&[
                ("pkg-1.0.0/docs/content/guide/intro.md", "# Intro\n"),
                ("pkg-1.0.0/README.md", "not docs"),
            ])))
            .mount(&server)
            .await;

        let content_root = tempfile::tempdir().unwrap();
        let cfg = config(content_root.path());
        let tree = TreeClient::new(server.uri(), "example/pkg").unwrap();
        let registry = RegistryClient::new(server.uri()).unwrap();

        let result = import_release(
            &cfg,
            &archive_release(),
            None,
            ResolveOptions::default(),
            &tree,
            &registry,
            Arc::new(FrontmatterTransform),
            &SilentProgress,
        )
        .await
        .unwrap()
        .expect("release imported");

        assert_eq!(result.files_written, 1);
        assert_eq!(result.release.resolved.as_deref(), Some("abc123"));
        assert_eq!(result.release.src.as_deref(), Some("docs/content"));

        let out = content_root.path().join("v1");
        assert!(out.join("guide/intro.md").exists());
        assert!(out.join("index.md").exists());
        assert!(out.join("guide/index.md").exists());
        let changelog = std::fs::read_to_string(out.join("using/changelog.md")).unwrap();
        assert!(changelog.contains(r"foo\>bar"));

        // Changelog leaf appended to the last (only) section.
        let last = result.nav.last().unwrap();
        assert_eq!(last.title, "Guide");
        assert_eq!(last.children.last().unwrap().title, "Changelog");
        assert_eq!(last.children.last().unwrap().url, "/v1/using/changelog");
    }

    #[tokio::test]
    async fn tree_import_end_to_end() {
        let server = MockServer::start().await;
        mount_repo_fixture(&server).await;

        Mock::given(method("GET"))
            .and(path("/repos/example/pkg/commits/release/v1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"sha": "headsha"})),
            )
            .mount(&server)
            .await;
        // The fixture 404s docs/lib/content, so the probe picks docs/content
        // and the fetcher lists its parent.
        Mock::given(method("GET"))
            .and(path("/repos/example/pkg/contents/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "content", "sha": "dirsha", "type": "dir"},
                {"name": "nav.yml", "sha": "navsha", "type": "file"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/example/pkg/git/trees/dirsha"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tree": [
                    {"path": "index.md", "sha": "b1", "type": "blob"},
                    {"path": "guide/intro.md", "sha": "b2", "type": "blob"}
                ],
                "truncated": false
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/example/pkg/git/blobs/b1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"# Home\n".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/example/pkg/git/blobs/b2"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"# Intro\n".to_vec()))
            .mount(&server)
            .await;

        let content_root = tempfile::tempdir().unwrap();
        let cfg = config(content_root.path());
        let tree = TreeClient::new(server.uri(), "example/pkg").unwrap();
        let registry = RegistryClient::new("http://127.0.0.1:1").unwrap();

        let result = import_release(
            &cfg,
            &branch_release(),
            None,
            ResolveOptions::default(),
            &tree,
            &registry,
            Arc::new(FrontmatterTransform),
            &SilentProgress,
        )
        .await
        .unwrap()
        .expect("release imported");

        assert_eq!(result.files_written, 2);
        assert_eq!(result.release.resolved.as_deref(), Some("headsha"));

        let out = content_root.path().join("v1");
        assert!(out.join("index.md").exists());
        assert!(out.join("guide/intro.md").exists());
        assert!(out.join("using/changelog.md").exists());
    }

    #[tokio::test]
    async fn unchanged_release_makes_no_filesystem_writes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pkg/1.0.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": "1.0.0",
                "gitHead": "same",
                "dist": {"tarball": "https://registry.example.com/pkg.tgz"}
            })))
            .mount(&server)
            .await;

        let content_root = tempfile::tempdir().unwrap();
        let cfg = config(content_root.path());
        let tree = TreeClient::new("http://127.0.0.1:1", "example/pkg").unwrap();
        let registry = RegistryClient::new(server.uri()).unwrap();

        let result = import_release(
            &cfg,
            &archive_release(),
            Some("same"),
            ResolveOptions::default(),
            &tree,
            &registry,
            Arc::new(FrontmatterTransform),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert!(result.is_none());
        assert!(!content_root.path().join("v1").exists());
    }

    #[tokio::test]
    async fn missing_source_dir_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/example/pkg/commits/release/v1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"sha": "headsha"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/example/pkg/contents/docs/lib/content"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/example/pkg/contents/docs/content"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let content_root = tempfile::tempdir().unwrap();
        let cfg = config(content_root.path());
        let tree = TreeClient::new(server.uri(), "example/pkg").unwrap();
        let registry = RegistryClient::new("http://127.0.0.1:1").unwrap();

        let err = import_release(
            &cfg,
            &branch_release(),
            None,
            ResolveOptions::default(),
            &tree,
            &registry,
            Arc::new(FrontmatterTransform),
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DocportError::SourceDirNotFound { .. }));
    }
}
