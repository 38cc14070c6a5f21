//! Concurrent fetch-and-parse of every source.
//!
//! Each URL is an independent unit: it suspends only while fetching, owns the
//! object graph it parses, and its failure is logged and dropped without
//! touching its siblings.

use std::future::Future;

use altmerge_core::{ParseOptions, source::Source};
use futures::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

use crate::client::{FetchError, HttpClient};

// ─── Fetching ────────────────────────────────────────────────────────────────

/// Anything that can turn a URL into a document body.
///
/// Implemented by [`HttpClient`]; tests substitute canned responses.
pub trait Fetch: Sync {
  fn fetch<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send + 'a;
}

impl Fetch for HttpClient {
  fn fetch<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send + 'a {
    self.get_bytes(url)
  }
}

/// Why one source was dropped.
#[derive(Debug, Error)]
pub enum SourceError {
  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Document(#[from] altmerge_json::Error),
}

// ─── Harvest ─────────────────────────────────────────────────────────────────

/// Fetch and parse a single source.
pub async fn fetch_source<F: Fetch>(
  fetcher: &F,
  url: &str,
  options: &ParseOptions,
) -> Result<Source, SourceError> {
  let body = fetcher.fetch(url).await?;
  Ok(altmerge_json::decode(&body, options)?)
}

/// Fetch and parse every URL concurrently and wait for all of them to settle.
///
/// Returns the sources that parsed, in the order their URLs were given.
pub async fn harvest<'a, F, I>(
  fetcher: &F,
  urls: I,
  options: &ParseOptions,
) -> Vec<Source>
where
  F: Fetch,
  I: IntoIterator<Item = &'a str>,
{
  let units = urls.into_iter().map(|url| async move {
    match fetch_source(fetcher, url, options).await {
      Ok(source) => {
        info!(
          url,
          source = %source.name,
          apps = source.apps.len(),
          "fetched source"
        );
        Some(source)
      }
      Err(e) => {
        warn!(url, error = %e, "dropping source");
        None
      }
    }
  });

  join_all(units).await.into_iter().flatten().collect()
}
