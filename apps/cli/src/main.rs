//! docport CLI — versioned release documentation importer.
//!
//! Pulls a package's documentation for each configured release into a static
//! site content tree, with navigation and per-directory index pages.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
