//! Candidate source URLs from directory services and the manual list.
//!
//! Channels run concurrently; a failing channel is logged and contributes
//! nothing, the others still do.

use std::{collections::BTreeSet, future::Future, path::Path, sync::LazyLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::{client::FetchError, harvest::Fetch, settings::DiscoveryConfig};

#[derive(Debug, Error)]
pub enum DiscoveryError {
  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error("malformed directory listing: {0}")]
  Listing(#[from] serde_json::Error),

  #[error("reading manual list: {0}")]
  Io(#[from] std::io::Error),
}

// ─── Parsers ─────────────────────────────────────────────────────────────────

/// `{"data": [{"url": ..}, ..]}`; entries without a URL are skipped.
pub fn parse_appdb(body: &[u8]) -> Result<BTreeSet<String>, serde_json::Error> {
  #[derive(Deserialize)]
  struct Listing {
    data: Vec<Value>,
  }

  let listing: Listing = serde_json::from_slice(body)?;
  Ok(
    listing
      .data
      .iter()
      .filter_map(|entry| entry.get("url")?.as_str())
      .map(str::trim)
      .filter(|url| !url.is_empty())
      .map(String::from)
      .collect(),
  )
}

static DEFAULT_REPOS: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"const\s+defaultRepos\s*=\s*(\[[\s\S]*?\]);")
    .expect("defaultRepos pattern is valid")
});

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"https?://[^\s"'\]]+"#).expect("url pattern is valid")
});

/// Pull the `defaultRepos` array out of a directory page. When the array is
/// not valid JSON, fall back to every `http(s)://` URL inside it.
pub fn parse_choco(page: &str) -> BTreeSet<String> {
  let Some(blob) = DEFAULT_REPOS.captures(page).and_then(|c| c.get(1)) else {
    return BTreeSet::new();
  };
  let blob = blob.as_str();

  match serde_json::from_str::<Vec<Value>>(blob) {
    Ok(items) => items
      .iter()
      .filter_map(Value::as_str)
      .map(str::trim)
      .filter(|url| !url.is_empty())
      .map(String::from)
      .collect(),
    Err(_) => BARE_URL
      .find_iter(blob)
      .map(|m| m.as_str().to_string())
      .collect(),
  }
}

/// One URL per line; blank lines and `#` comments are ignored.
pub fn parse_manual(text: &str) -> BTreeSet<String> {
  text
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty() && !line.starts_with('#'))
    .map(String::from)
    .collect()
}

// ─── Channels ────────────────────────────────────────────────────────────────

async fn from_appdb<F: Fetch>(
  fetcher: &F,
  url: Option<&str>,
) -> Result<BTreeSet<String>, DiscoveryError> {
  let Some(url) = url else {
    return Ok(BTreeSet::new());
  };
  Ok(parse_appdb(&fetcher.fetch(url).await?)?)
}

async fn from_choco<F: Fetch>(
  fetcher: &F,
  url: Option<&str>,
) -> Result<BTreeSet<String>, DiscoveryError> {
  let Some(url) = url else {
    return Ok(BTreeSet::new());
  };
  let body = fetcher.fetch(url).await?;
  Ok(parse_choco(&String::from_utf8_lossy(&body)))
}

async fn from_manual(path: &Path) -> Result<BTreeSet<String>, DiscoveryError> {
  let text = tokio::fs::read_to_string(path).await?;
  Ok(parse_manual(&text))
}

async fn channel(
  name: &'static str,
  unit: impl Future<Output = Result<BTreeSet<String>, DiscoveryError>>,
) -> BTreeSet<String> {
  match unit.await {
    Ok(urls) => {
      info!(channel = name, count = urls.len(), "discovery channel done");
      urls
    }
    Err(e) => {
      warn!(channel = name, error = %e, "discovery channel failed");
      BTreeSet::new()
    }
  }
}

/// Union of all channels, deduplicated and sorted.
pub async fn discover<F: Fetch>(
  fetcher: &F,
  config: &DiscoveryConfig,
  urls_file: &Path,
) -> BTreeSet<String> {
  let (appdb, choco, manual) = tokio::join!(
    channel("appdb", from_appdb(fetcher, config.appdb_url.as_deref())),
    channel("choco", from_choco(fetcher, config.choco_url.as_deref())),
    channel("manual", from_manual(urls_file)),
  );
  appdb.into_iter().chain(choco).chain(manual).collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
