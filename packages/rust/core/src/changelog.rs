//! Changelog fetch, escape, and navigation merge.
//!
//! The changelog lives at a fixed path in the upstream repository. Its body
//! is markup-unsafe for the site renderer: every `>` not already preceded by
//! a backslash gets escaped before the transform runs. The merged result is
//! appended as a leaf to the last top-level navigation section, so this must
//! run after every other navigation consumer has captured its view.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, instrument};

use docport_shared::{
    DocportError, Frontmatter, NavNode, Release, Result, Transform, TransformContext,
};
use docport_source::TreeClient;

/// Repo path of the changelog document.
pub const CHANGELOG_SRC: &str = "CHANGELOG.md";

/// Site-relative document path the changelog is written to.
pub const CHANGELOG_DOC_PATH: &str = "using/changelog";

/// Navigation description for the appended leaf.
const CHANGELOG_DESCRIPTION: &str = "Notable changes in this release";

/// Escape `>` when not preceded by a backslash: `([^\])>` → `$1\>`.
pub fn escape_unescaped_gt(input: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"([^\\])>").expect("static regex"));
    re.replace_all(input, r"$1\>").into_owned()
}

/// Fetch the changelog, write it under the release's output directory, and
/// append its navigation leaf to the last top-level section of `nav`.
#[instrument(skip_all, fields(release = %release.id))]
pub async fn merge_changelog(
    release: &Release,
    tree: &TreeClient,
    out: &Path,
    nav: &mut Vec<NavNode>,
    transform: &dyn Transform,
) -> Result<()> {
    let reference = release.resolved.as_deref().ok_or_else(|| {
        DocportError::validation(format!("release {} has no resolved ref", release.id))
    })?;

    let body = tree.file(CHANGELOG_SRC, reference).await?;
    let escaped = escape_unescaped_gt(&body);

    let rel = format!("{CHANGELOG_DOC_PATH}.md");
    let ctx = TransformContext {
        release,
        path: rel.clone(),
        frontmatter: Some(Frontmatter {
            github_path: Some(CHANGELOG_SRC.to_string()),
            title: Some("Changelog".to_string()),
            shortname: None,
        }),
    };
    let content = transform.apply(escaped.as_bytes(), &ctx)?;

    let target = out.join(&rel);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DocportError::io(parent, e))?;
    }
    std::fs::write(&target, content).map_err(|e| DocportError::io(&target, e))?;

    let section = nav.last_mut().ok_or_else(|| {
        DocportError::validation("navigation has no sections to merge the changelog into")
    })?;
    section.children.push(NavNode {
        title: "Changelog".into(),
        url: format!("{}/{CHANGELOG_DOC_PATH}", release.base_url()),
        shortname: None,
        description: Some(CHANGELOG_DESCRIPTION.into()),
        children: vec![],
    });

    debug!(target = %target.display(), "changelog merged");
    Ok(())
}
