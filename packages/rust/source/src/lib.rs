//! Remote source clients for docport: tree API, package registry, and
//! archive download. Only the request/response contracts matter to the
//! pipeline; all transport failures surface as [`docport_shared::DocportError::Network`]
//! or [`docport_shared::DocportError::StreamExtraction`].

pub mod archive;
pub mod registry;
pub mod tree;

pub use archive::fetch_archive;
pub use registry::RegistryClient;
pub use tree::{DirEntry, TreeClient, TreeEntry};

/// User-Agent string for all outbound requests.
pub(crate) const USER_AGENT: &str = concat!("docport/", env!("CARGO_PKG_VERSION"));
