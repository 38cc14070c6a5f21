//! JSON codec for altmerge catalog documents.
//!
//! Decodes raw catalog payloads into [`altmerge_core`] records and encodes
//! records back into the published catalog schema. Pure synchronous; no HTTP
//! or filesystem dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use altmerge_core::ParseOptions;
//!
//! let body = br#"{"name": "Repo", "apps": [{"name": "X", "bundleIdentifier": "com.x"}]}"#;
//! let source = altmerge_json::decode(body, &ParseOptions::default()).unwrap();
//! println!("{}", altmerge_json::encode(&source).unwrap());
//! ```

pub mod encode;
pub mod error;

use altmerge_core::{ParseOptions, source::Source};
pub use encode::SourceDocument;
pub use error::{Error, Result};
use serde_json::Value;

// ─── Public API ──────────────────────────────────────────────────────────────

/// Decode one catalog document.
///
/// Malformed JSON yields [`Error::Decode`]; well-formed JSON that fails
/// source validation yields [`Error::Document`].
pub fn decode(body: &[u8], options: &ParseOptions) -> Result<Source> {
  let value: Value = serde_json::from_slice(body).map_err(Error::Decode)?;
  Ok(Source::from_value(value, options)?)
}

/// Encode `source` as pretty-printed JSON (two-space indentation).
pub fn encode(source: &Source) -> Result<String> {
  serde_json::to_string_pretty(&SourceDocument::from(source))
    .map_err(Error::Encode)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
