//! The HTTP client shared by every fetch in a run.

use std::{error::Error as _, time::Duration};

use anyhow::{Context, Result};
use reqwest::Client;
use thiserror::Error;

/// Why a single fetch failed. Always scoped to the one URL being fetched.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("DNS resolution failed: {0}")]
  Dns(String),

  #[error("timed out: {0}")]
  Timeout(String),

  #[error("invalid URL: {0}")]
  InvalidUrl(String),

  #[error("certificate verification failed: {0}")]
  Certificate(String),

  #[error("connection failed: {0}")]
  Connection(String),

  #[error("unexpected HTTP status {0}")]
  Status(u16),
}

impl From<reqwest::Error> for FetchError {
  fn from(err: reqwest::Error) -> Self {
    let detail = describe(&err);
    let lowered = detail.to_ascii_lowercase();

    if err.is_timeout() {
      Self::Timeout(detail)
    } else if err.is_builder() {
      Self::InvalidUrl(detail)
    } else if lowered.contains("dns error")
      || lowered.contains("failed to lookup address")
    {
      Self::Dns(detail)
    } else if lowered.contains("certificate") {
      Self::Certificate(detail)
    } else {
      Self::Connection(detail)
    }
  }
}

/// The error and its whole source chain on one line; reqwest keeps the useful
/// part (resolver, TLS) several levels down.
fn describe(err: &reqwest::Error) -> String {
  let mut text = err.to_string();
  let mut source = err.source();
  while let Some(inner) = source {
    text.push_str(": ");
    text.push_str(&inner.to_string());
    source = inner.source();
  }
  text
}

/// Pooled HTTP client handle, created once per run and passed by reference to
/// every fetch. The pool is released when the last handle drops.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct HttpClient {
  client: Client,
}

impl HttpClient {
  /// `timeout` bounds each request individually.
  pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .user_agent(user_agent)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client })
  }

  /// `GET url`, returning the body of a successful response.
  pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
    let resp = self.client.get(url).send().await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(FetchError::Status(status.as_u16()));
    }
    Ok(resp.bytes().await?.to_vec())
  }
}
