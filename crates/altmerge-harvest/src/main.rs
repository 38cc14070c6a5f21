//! `altmerge`: build unified app catalogs from every known source.
//!
//! # Usage
//!
//! ```text
//! altmerge --config altmerge.toml
//! RUST_LOG=debug altmerge --output-dir public/
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Merge app-catalog sources into one")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "altmerge.toml")]
  config: PathBuf,

  /// Directory the catalogs are written to (overrides the config file).
  #[arg(short, long, value_name = "DIR")]
  output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut config = altmerge_harvest::settings::load(&cli.config)?;
  if let Some(dir) = cli.output_dir {
    config.output_dir = dir;
  }

  let summary = altmerge_harvest::run(&config).await?;
  tracing::info!(
    discovered = summary.discovered,
    sources = summary.sources,
    apps = summary.apps,
    primary = summary.primary,
    flagged = summary.flagged,
    "run complete"
  );

  Ok(())
}
