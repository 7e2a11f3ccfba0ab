//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docport_core::pipeline::{ImportConfig, ImportResult, ProgressReporter, import_release};
use docport_core::resolver::ResolveOptions;
use docport_shared::{
    AppConfig, FrontmatterTransform, ImportLock, Release, Transform, config_file_path,
    init_config, load_config, load_config_from,
};
use docport_source::{RegistryClient, TreeClient};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docport — import versioned release documentation into a site content tree.
#[derive(Parser)]
#[command(
    name = "docport",
    version,
    about = "Import a package's release documentation into a static site content tree.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Import one release, or all configured releases.
    Import {
        /// Release id to import (e.g. v9). Omit with --all to import everything.
        release: Option<String>,

        /// Import every configured release.
        #[arg(long)]
        all: bool,

        /// Re-import even when the resolved identifier is unchanged.
        #[arg(long)]
        force: bool,

        /// Include prereleases.
        #[arg(long)]
        prerelease: bool,

        /// Config file path (defaults to ~/.docport/docport.toml).
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List configured releases and their last imported identifiers.
    List {
        /// Config file path (defaults to ~/.docport/docport.toml).
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
    /// Print the config file path.
    Path,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docport=info",
        1 => "docport=debug",
        _ => "docport=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Import {
            release,
            all,
            force,
            prerelease,
            config,
        } => cmd_import(release.as_deref(), all, force, prerelease, config.as_deref()).await,
        Command::List { config } => cmd_list(config.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
            ConfigAction::Path => cmd_config_path().await,
        },
    }
}

fn load(config: Option<&std::path::Path>) -> Result<AppConfig> {
    Ok(match config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_import(
    release_id: Option<&str>,
    all: bool,
    force: bool,
    prerelease: bool,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let config = load(config_path)?;

    let releases: Vec<&Release> = match (release_id, all) {
        (Some(id), false) => {
            let release = config
                .releases
                .iter()
                .find(|r| r.id == id)
                .ok_or_else(|| eyre!("no release '{id}' in config"))?;
            vec![release]
        }
        (None, true) => config.releases.iter().collect(),
        (None, false) => return Err(eyre!("pass a release id or --all")),
        (Some(_), true) => return Err(eyre!("--all conflicts with a release id")),
    };

    let content_root = PathBuf::from(&config.site.content_root);
    let import_config = ImportConfig {
        content_root: content_root.clone(),
        base_nav: config.site.base_nav.clone(),
        package: config.source.package.clone(),
        fetch_concurrency: config.source.fetch_concurrency as usize,
    };
    let opts = ResolveOptions { force, prerelease };

    let tree = TreeClient::new(&config.source.api_base, &config.source.repo)?;
    let registry = RegistryClient::new(&config.source.registry_base)?;
    let transform: Arc<dyn Transform> = Arc::new(FrontmatterTransform);

    let mut lock = ImportLock::load(&content_root)?;
    let mut imported = 0usize;
    let mut skipped = 0usize;

    for release in releases {
        info!(release = %release.id, "importing");
        let reporter = CliProgress::new(&release.id);

        let result = import_release(
            &import_config,
            release,
            lock.resolved(&release.id),
            opts,
            &tree,
            &registry,
            transform.clone(),
            &reporter,
        )
        .await?;

        match result {
            Some(result) => {
                let resolved = result
                    .release
                    .resolved
                    .as_deref()
                    .ok_or_else(|| eyre!("import returned no resolved identifier"))?;
                lock.record(&release.id, resolved);
                lock.save(&content_root)?;
                imported += 1;
                print_summary(&result);
            }
            None => {
                skipped += 1;
                println!("  {} skipped (up to date)", release.id);
            }
        }
    }

    println!();
    println!("  {imported} imported, {skipped} skipped");
    Ok(())
}

fn print_summary(result: &ImportResult) {
    println!();
    println!("  Release imported!");
    println!("  Id:       {}", result.release.id);
    println!("  Version:  {}", result.release.version);
    println!(
        "  Resolved: {}",
        result.release.resolved.as_deref().unwrap_or("-")
    );
    println!("  Files:    {}", result.files_written);
    println!("  Sections: {}", result.nav.len());
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

async fn cmd_list(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = load(config_path)?;
    let lock = ImportLock::load(&PathBuf::from(&config.site.content_root))?;

    for release in &config.releases {
        let strategy = if release.use_branch { "tree" } else { "archive" };
        let last = lock.resolved(&release.id).unwrap_or("never imported");
        println!(
            "  {:<8} {:<10} {:<8} {}",
            release.id, release.version, strategy, last
        );
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config = load(None)?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

async fn cmd_config_path() -> Result<()> {
    println!("{}", config_file_path()?.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
    release: String,
}

impl CliProgress {
    fn new(release: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self {
            spinner,
            release: release.to_string(),
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(format!("{} {name}", self.release));
    }

    fn files_extracted(&self, count: usize) {
        self.spinner
            .set_message(format!("{} extracted {count} files", self.release));
    }

    fn done(&self, _result: &ImportResult) {
        self.spinner.finish_and_clear();
    }
}
