//! Error types for docport.
//!
//! Library crates use [`DocportError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docport operations.
///
/// Every fatal kind aborts the release import it occurred in; there is no
/// retry or partial recovery anywhere in the pipeline. Skips (prerelease,
/// unchanged) are not errors and are modeled as values by the resolver.
#[derive(Debug, thiserror::Error)]
pub enum DocportError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Remote fetch failure (tree API, registry, or archive download).
    #[error("remote fetch failed: {0}")]
    Network(String),

    /// Navigation description or API payload parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Neither candidate documentation source directory exists in the repo.
    #[error("no documentation source directory found for {release} (tried {tried:?})")]
    SourceDirNotFound { release: String, tried: Vec<String> },

    /// No navigation node matches an output directory during index generation.
    #[error("no navigation entry matches directory {dir:?}")]
    NavMatchNotFound { dir: String },

    /// Archive stream or tar entry failure during extraction.
    #[error("archive extraction failed: {0}")]
    StreamExtraction(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (unexpected payload shape, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocportError>;

impl DocportError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
