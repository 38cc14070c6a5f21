//! Error types for the altmerge-json codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The payload is not well-formed JSON.
  #[error("JSON decode error: {0}")]
  Decode(#[source] serde_json::Error),

  /// Well-formed JSON that is not an acceptable catalog document.
  #[error("invalid document: {0}")]
  Document(#[from] altmerge_core::Error),

  #[error("JSON encode error: {0}")]
  Encode(#[source] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
