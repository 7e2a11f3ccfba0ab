//! Shared types, error model, and configuration for docport.
//!
//! This crate is the foundation depended on by all other docport crates.
//! It provides:
//! - [`DocportError`] — the unified error type
//! - Domain types ([`Release`], [`NavNode`], [`FileRecord`], [`ImportLock`])
//! - The per-file content [`Transform`] contract
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod transform;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, SiteConfig, SourceConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{DocportError, Result};
pub use transform::{Frontmatter, FrontmatterTransform, Transform, TransformContext};
pub use types::{
    Dist, FileRecord, ImportLock, LOCK_FILE_NAME, LockEntry, Manifest, NavNode, Release,
    output_dirs,
};
