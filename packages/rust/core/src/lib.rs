//! Core pipeline orchestration and domain logic for docport.
//!
//! This crate ties together resolution, navigation building, extraction,
//! index synthesis, and the changelog merge into the end-to-end release
//! import workflow.

pub mod changelog;
pub mod index;
pub mod nav;
pub mod pipeline;
pub mod resolver;

pub use changelog::merge_changelog;
pub use index::write_indexes;
pub use nav::{ReleaseNav, build_nav, parse_nav, rewrite_urls};
pub use pipeline::{
    ImportConfig, ImportResult, ProgressReporter, SilentProgress, import_release,
};
pub use resolver::{Resolution, ResolveOptions, SkipReason, resolve};
