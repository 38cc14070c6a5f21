//! Error types for `altmerge-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The app entry has no usable `bundleIdentifier`. Fatal to that app only.
  #[error("invalid bundle identifier for app {name:?}")]
  InvalidBundleIdentifier { name: Option<String> },

  /// The document declares no apps at all. Fatal to the whole source.
  #[error("no apps declared by source {name:?}")]
  InvalidApps { name: Option<String> },

  #[error("source document has no name")]
  InvalidName,

  #[error("unparseable timestamp: {0:?}")]
  InvalidTimestamp(String),

  #[error("{record} is missing required field `{field}`")]
  MissingField {
    record: &'static str,
    field:  &'static str,
  },

  #[error("{0} entry is not a JSON object")]
  NotAnObject(&'static str),

  #[error("serialization error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
