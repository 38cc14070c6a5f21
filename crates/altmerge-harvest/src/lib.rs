//! Harvesting pipeline for altmerge.
//!
//! Discovers source URLs, fetches and parses every source concurrently over
//! one shared HTTP client, merges all apps and writes the primary and flagged
//! catalogs.

pub mod client;
pub mod discovery;
pub mod harvest;
pub mod settings;

use std::{path::Path, time::Duration};

use altmerge_core::{merge::MergeStats, source::Source};
use anyhow::Context as _;
use tracing::info;

use client::HttpClient;
use harvest::Fetch;
use settings::HarvestConfig;

/// What a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub discovered: usize,
  pub sources:    usize,
  pub apps:       usize,
  pub merge:      MergeStats,
  pub primary:    usize,
  pub flagged:    usize,
}

/// Run the whole pipeline over a freshly built HTTP client.
///
/// The client lives exactly as long as this call; a failure to build it
/// aborts the run before anything is fetched.
pub async fn run(config: &HarvestConfig) -> anyhow::Result<RunSummary> {
  let client = HttpClient::new(
    Duration::from_secs(config.request_timeout_secs),
    &config.user_agent,
  )?;
  run_with(&client, config).await
}

/// Run the pipeline over any [`Fetch`] implementation.
pub async fn run_with<F: Fetch>(
  fetcher: &F,
  config: &HarvestConfig,
) -> anyhow::Result<RunSummary> {
  let urls =
    discovery::discover(fetcher, &config.discovery, &config.urls_file).await;
  info!(count = urls.len(), "discovered source urls");

  let options = config.parse_options();
  let sources =
    harvest::harvest(fetcher, urls.iter().map(String::as_str), &options).await;

  let source_count = sources.len();
  let apps: Vec<_> = sources.into_iter().flat_map(|s| s.apps).collect();
  let app_count = apps.len();

  let merged = altmerge_core::merge::merge(apps);
  let stats = merged.stats;
  info!(
    considered = stats.considered,
    without_versions = stats.without_versions,
    marketplace_variants = stats.marketplace_variants,
    duplicates = stats.duplicates,
    kept = merged.len(),
    "merged apps"
  );

  let split = merged.partition(&config.flagging);
  let summary = RunSummary {
    discovered: urls.len(),
    sources:    source_count,
    apps:       app_count,
    merge:      stats,
    primary:    split.primary.len(),
    flagged:    split.flagged.len(),
  };

  write_catalog(&config.primary_path(), &config.catalog.to_source(split.primary))
    .await?;
  write_catalog(&config.flagged_path(), &config.catalog.to_source(split.flagged))
    .await?;

  Ok(summary)
}

/// Encode `catalog` and write it to `path`, creating parent directories.
pub async fn write_catalog(path: &Path, catalog: &Source) -> anyhow::Result<()> {
  let json = altmerge_json::encode(catalog)?;
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("creating {}", parent.display()))?;
  }
  tokio::fs::write(path, json)
    .await
    .with_context(|| format!("writing {}", path.display()))?;
  info!(path = %path.display(), apps = catalog.apps.len(), "wrote catalog");
  Ok(())
}
