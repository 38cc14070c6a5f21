//! Core object model and merge engine for altmerge.
//!
//! Turns loosely-standardised app-catalog documents into validated
//! [`Source`](source::Source) / [`App`](app::App) /
//! [`Version`](version::Version) records, and collapses apps from many
//! sources into one catalog keyed by bundle identifier.
//!
//! Everything here is synchronous and free of HTTP and filesystem access.

pub mod app;
pub mod error;
pub mod merge;
pub mod raw;
pub mod source;
pub mod timestamp;
pub mod version;

pub use error::{Error, Result};
pub use timestamp::{Instant, normalize};

/// Icon used for apps whose document leaves `iconURL` empty or missing.
pub const DEFAULT_ICON_URL: &str = "https://altstore.io/apple-touch-icon.png";

/// Knobs applied while building records from raw documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
  /// Substituted for an app's missing or empty `iconURL`.
  pub default_icon_url: String,
}

impl Default for ParseOptions {
  fn default() -> Self {
    Self {
      default_icon_url: DEFAULT_ICON_URL.to_string(),
    }
  }
}
