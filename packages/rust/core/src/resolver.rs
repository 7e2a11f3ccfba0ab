//! Release resolution and change detection.
//!
//! The idempotence gate of the pipeline: decides whether a release needs
//! (re)processing before anything touches the output directory, and
//! populates the resolution fields the extraction strategies rely on.

use tracing::{debug, instrument};

use docport_shared::{DocportError, Release, Result};
use docport_source::{RegistryClient, TreeClient};

/// Caller options for one import run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Re-process even when the resolved identifier is unchanged.
    pub force: bool,
    /// Opt into importing prereleases.
    pub prerelease: bool,
}

/// Why a release was skipped. Skips are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The release is a prerelease and the caller did not opt in.
    Prerelease,
    /// The resolved identifier matches the previous import.
    Unchanged,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prerelease => write!(f, "prerelease (pass --prerelease to include)"),
            Self::Unchanged => write!(f, "unchanged since last import"),
        }
    }
}

/// Outcome of resolution: either nothing to do, or a release ready to process.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// No-op; the pipeline must not touch the output directory.
    Skip(SkipReason),
    /// Release with `resolved` (and `spec`, for archive releases) populated.
    Ready(Release),
}

/// Resolve a release against its upstream source.
///
/// `previous` is the content-address recorded by the last successful import,
/// if any. Branch-based releases resolve to the branch head; the rest take
/// their identifier and archive URL from the registry manifest.
#[instrument(skip_all, fields(release = %release.id))]
pub async fn resolve(
    release: &Release,
    previous: Option<&str>,
    opts: ResolveOptions,
    tree: &TreeClient,
    registry: &RegistryClient,
    package: &str,
) -> Result<Resolution> {
    if release.prerelease && !opts.prerelease {
        return Ok(Resolution::Skip(SkipReason::Prerelease));
    }

    let mut release = release.clone();

    if release.use_branch {
        let branch = release.branch.as_deref().ok_or_else(|| {
            DocportError::validation(format!(
                "release {} is branch-based but has no branch",
                release.id
            ))
        })?;
        release.resolved = Some(tree.resolve_branch(branch).await?);
    } else {
        let manifest = registry.manifest(package, &release.version).await?;
        let git_head = manifest.git_head.ok_or_else(|| {
            DocportError::validation(format!(
                "manifest for {package}@{} has no gitHead",
                release.version
            ))
        })?;
        release.resolved = Some(git_head);
        release.spec = Some(manifest.dist.tarball);
    }

    if !opts.force && release.resolved.as_deref() == previous {
        debug!(resolved = ?release.resolved, "resolved identifier unchanged");
        return Ok(Resolution::Skip(SkipReason::Unchanged));
    }

    Ok(Resolution::Ready(release))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn release(use_branch: bool, prerelease: bool) -> Release {
        Release {
            id: "v2".into(),
            version: "2.0.0".into(),
            branch: use_branch.then(|| "release/v2".to_string()),
            use_branch,
            prerelease,
            url_prefix: "v2".into(),
            resolved: None,
            spec: None,
            src: None,
        }
    }

    // Clients pointing nowhere, for paths that must not touch the network.
    fn offline_clients() -> (TreeClient, RegistryClient) {
        (
            TreeClient::new("http://127.0.0.1:1", "example/pkg").unwrap(),
            RegistryClient::new("http://127.0.0.1:1").unwrap(),
        )
    }

    #[tokio::test]
    async fn prerelease_skipped_without_opt_in() {
        let (tree, registry) = offline_clients();
        let resolution = resolve(
            &release(false, true),
            None,
            ResolveOptions::default(),
            &tree,
            &registry,
            "pkg",
        )
        .await
        .unwrap();
        assert!(matches!(resolution, Resolution::Skip(SkipReason::Prerelease)));
    }

    #[tokio::test]
    async fn unchanged_branch_release_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/example/pkg/commits/release/v2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"sha": "same"})),
            )
            .mount(&server)
            .await;

        let tree = TreeClient::new(server.uri(), "example/pkg").unwrap();
        let registry = RegistryClient::new("http://127.0.0.1:1").unwrap();

        let resolution = resolve(
            &release(true, false),
            Some("same"),
            ResolveOptions::default(),
            &tree,
            &registry,
            "pkg",
        )
        .await
        .unwrap();
        assert!(matches!(resolution, Resolution::Skip(SkipReason::Unchanged)));
    }

    #[tokio::test]
    async fn force_overrides_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/example/pkg/commits/release/v2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"sha": "same"})),
            )
            .mount(&server)
            .await;

        let tree = TreeClient::new(server.uri(), "example/pkg").unwrap();
        let registry = RegistryClient::new("http://127.0.0.1:1").unwrap();

        let resolution = resolve(
            &release(true, false),
            Some("same"),
            ResolveOptions {
                force: true,
                prerelease: false,
            },
            &tree,
            &registry,
            "pkg",
        )
        .await
        .unwrap();

        match resolution {
            Resolution::Ready(r) => assert_eq!(r.resolved.as_deref(), Some("same")),
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn manifest_release_gets_resolved_and_spec() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pkg/2.0.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": "2.0.0",
                "gitHead": "abc123",
                "dist": {"tarball": "https://registry.example.com/pkg/-/pkg-2.0.0.tgz"}
            })))
            .mount(&server)
            .await;

        let tree = TreeClient::new("http://127.0.0.1:1", "example/pkg").unwrap();
        let registry = RegistryClient::new(server.uri()).unwrap();

        let resolution = resolve(
            &release(false, false),
            Some("old"),
            ResolveOptions::default(),
            &tree,
            &registry,
            "pkg",
        )
        .await
        .unwrap();

        match resolution {
            Resolution::Ready(r) => {
                assert_eq!(r.resolved.as_deref(), Some("abc123"));
                assert!(r.spec.as_deref().unwrap().ends_with(".tgz"));
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn manifest_without_githead_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pkg/2.0.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": "2.0.0",
                "dist": {"tarball": "https://x.example/pkg.tgz"}
            })))
            .mount(&server)
            .await;

        let tree = TreeClient::new("http://127.0.0.1:1", "example/pkg").unwrap();
        let registry = RegistryClient::new(server.uri()).unwrap();

        let err = resolve(
            &release(false, false),
            None,
            ResolveOptions::default(),
            &tree,
            &registry,
            "pkg",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DocportError::Validation { .. }));
    }
}
