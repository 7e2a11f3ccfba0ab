//! Per-directory index page synthesis.
//!
//! Every output directory gets one `index.md` whose body is a fixed directive
//! telling the site renderer to display that directory's navigation one level
//! deep. The matching navigation node is resolved through an explicit
//! directory→node map built once per run; a missing mapping is the typed
//! error [`DocportError::NavMatchNotFound`], never a crash.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, instrument};

use docport_shared::{
    DocportError, Frontmatter, NavNode, Release, Result, Transform, TransformContext,
};

use crate::nav::ReleaseNav;

/// Body of every synthesized index document.
pub const INDEX_BODY: &str = "<Index depth=\"1\"></Index>";

/// Write one index document per output directory.
///
/// `dirs` is the derived directory set: `""` for the release root plus every
/// distinct directory containing an extracted file. The root directory is
/// matched against the site's base navigation by the release's url prefix;
/// subdirectories are matched against the release's own navigation children
/// by their url basename.
#[instrument(skip_all, fields(release = %release.id, dirs = dirs.len()))]
pub fn write_indexes(
    release: &Release,
    nav: &ReleaseNav,
    base_nav: &[NavNode],
    out: &Path,
    dirs: &[String],
    transform: &dyn Transform,
) -> Result<()> {
    let lookup = build_lookup(release, nav, base_nav);

    for dir in dirs {
        let key = dir_key(dir);
        let node = lookup
            .get(key)
            .ok_or_else(|| DocportError::NavMatchNotFound { dir: dir.clone() })?;

        let rel = if dir.is_empty() {
            "index.md".to_string()
        } else {
            format!("{dir}/index.md")
        };

        let ctx = TransformContext {
            release,
            path: rel.clone(),
            frontmatter: Some(Frontmatter {
                github_path: Some(nav.path.clone()),
                title: Some(node.title.clone()),
                shortname: node.shortname.clone(),
            }),
        };
        let content = transform.apply(INDEX_BODY.as_bytes(), &ctx)?;

        let target = out.join(&rel);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocportError::io(parent, e))?;
        }
        std::fs::write(&target, content).map_err(|e| DocportError::io(&target, e))?;
        debug!(dir = %dir, node = %node.title, "index written");
    }

    Ok(())
}

/// Directory→node map: `""` from the base navigation, everything else from
/// the release navigation's top-level children.
fn build_lookup<'a>(
    release: &Release,
    nav: &'a ReleaseNav,
    base_nav: &'a [NavNode],
) -> HashMap<&'a str, &'a NavNode> {
    let mut lookup: HashMap<&str, &NavNode> = HashMap::new();

    if let Some(root) = base_nav
        .iter()
        .find(|n| n.url_basename() == release.url_prefix)
    {
        lookup.insert("", root);
    }

    for child in &nav.children {
        lookup.insert(child.url_basename(), child);
    }

    lookup
}

/// Lookup key for a directory: its final path segment.
fn dir_key(dir: &str) -> &str {
    dir.rsplit('/').next().unwrap_or(dir)
}
