//! The per-file content transform contract.
//!
//! The pipeline treats the transform as an opaque function: bytes in, string
//! out, parameterized by the release and the file's output-relative path.
//! It must be deterministic for identical inputs and never changes the
//! logical file count.

use serde::Serialize;

use crate::error::{DocportError, Result};
use crate::types::Release;

/// Context handed to the transform for every file.
#[derive(Debug)]
pub struct TransformContext<'a> {
    /// The release being imported.
    pub release: &'a Release,
    /// Output-relative path of the file being written.
    pub path: String,
    /// Frontmatter to attach, for synthesized documents.
    pub frontmatter: Option<Frontmatter>,
}

/// Frontmatter fields attached to synthesized documents.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Frontmatter {
    /// Source path within the upstream repository.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_path: Option<String>,
    /// Page title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Short name used in breadcrumbs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortname: Option<String>,
}

/// The content transform applied to every file before it hits disk.
pub trait Transform: Send + Sync {
    /// Rewrite one file's content. The output replaces the input bytes.
    fn apply(&self, input: &[u8], ctx: &TransformContext<'_>) -> Result<String>;
}

/// Default transform: prepend a YAML frontmatter block when one is supplied,
/// pass the body through otherwise.
#[derive(Debug, Default)]
pub struct FrontmatterTransform;

impl Transform for FrontmatterTransform {
    fn apply(&self, input: &[u8], ctx: &TransformContext<'_>) -> Result<String> {
        let body = std::str::from_utf8(input)
            .map_err(|e| {
                DocportError::validation(format!("{}: not valid UTF-8: {e}", ctx.path))
            })?
            .to_string();

        match &ctx.frontmatter {
            Some(fm) => {
                let yaml = serde_yaml::to_string(fm)
                    .map_err(|e| DocportError::validation(e.to_string()))?;
                Ok(format!("---\n{yaml}---\n\n{body}"))
            }
            None => Ok(body),
        }
    }
}
