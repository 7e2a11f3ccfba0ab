//! Application configuration for docport.
//!
//! User config lives at `~/.docport/docport.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocportError, Result};
use crate::types::Release;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docport.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docport";

// ---------------------------------------------------------------------------
// Config structs (matching docport.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Site output settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Upstream source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Releases to import.
    #[serde(default)]
    pub releases: Vec<Release>,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Root of the site content tree; releases land at `<content_root>/<id>/`.
    #[serde(default = "default_content_root")]
    pub content_root: String,

    /// Site base navigation file, relative to `content_root`.
    #[serde(default = "default_base_nav")]
    pub base_nav: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_root: default_content_root(),
            base_nav: default_base_nav(),
        }
    }
}

fn default_content_root() -> String {
    "content".into()
}
fn default_base_nav() -> String {
    "nav.yml".into()
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Upstream repository as `owner/name`.
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Tree API base URL (overridable so tests can point at a mock server).
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Package registry base URL.
    #[serde(default = "default_registry_base")]
    pub registry_base: String,

    /// Package name in the registry.
    #[serde(default = "default_package")]
    pub package: String,

    /// Maximum simultaneous in-flight file fetches on the tree path.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            repo: default_repo(),
            api_base: default_api_base(),
            registry_base: default_registry_base(),
            package: default_package(),
            fetch_concurrency: default_fetch_concurrency(),
        }
    }
}

fn default_repo() -> String {
    "example/pkg".into()
}
fn default_api_base() -> String {
    "https://api.github.com".into()
}
fn default_registry_base() -> String {
    "https://registry.npmjs.org".into()
}
fn default_package() -> String {
    "pkg".into()
}
fn default_fetch_concurrency() -> u32 {
    8
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docport/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocportError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docport/docport.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocportError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        DocportError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocportError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocportError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocportError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("content_root"));
        assert!(toml_str.contains("api.github.com"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.site.content_root, "content");
        assert_eq!(parsed.source.fetch_concurrency, 8);
    }

    #[test]
    fn config_with_releases() {
        let toml_str = r#"
[site]
content_root = "/srv/site/content"

[source]
repo = "example/pkg"

[[releases]]
id = "v2"
version = "2.0.0"
url_prefix = "v2"

[[releases]]
id = "latest"
version = "3.0.0-pre.1"
url_prefix = "latest"
branch = "release/v3"
use_branch = true
prerelease = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.releases.len(), 2);
        assert_eq!(config.releases[0].id, "v2");
        assert!(!config.releases[0].use_branch);
        assert!(config.releases[1].use_branch);
        assert_eq!(config.releases[1].branch.as_deref(), Some("release/v3"));
        assert!(config.releases[1].prerelease);
    }
}
