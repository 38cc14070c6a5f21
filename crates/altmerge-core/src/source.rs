//! Source records: one upstream catalog document.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
  Error, ParseOptions, Result,
  app::App,
  raw::{RawSource, de},
};

// ─── News ────────────────────────────────────────────────────────────────────

/// An announcement carried by a source. `identifier` is unique within its
/// source; `date` is kept exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct News {
  #[serde(deserialize_with = "de::required_text")]
  pub identifier: String,
  #[serde(default, deserialize_with = "de::text")]
  pub title:      Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub caption:    Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub date:       Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub tint_color: Option<String>,
  #[serde(default, rename = "imageURL", deserialize_with = "de::text")]
  pub image_url:  Option<String>,
  #[serde(default, deserialize_with = "de::lenient")]
  pub notify:     Option<bool>,
  #[serde(default, deserialize_with = "de::text")]
  pub url:        Option<String>,
  #[serde(default, rename = "appID", deserialize_with = "de::text")]
  pub app_id:     Option<String>,
}

/// Keep news items with an identifier, first occurrence wins.
fn collect_news(raw: Vec<Value>, source: &str) -> Vec<News> {
  let mut seen = HashSet::new();
  raw
    .into_iter()
    .filter_map(|item| match serde_json::from_value::<News>(item) {
      Ok(news) => Some(news),
      Err(e) => {
        warn!(source, error = %e, "dropping news item");
        None
      }
    })
    .filter(|news| {
      let fresh = seen.insert(news.identifier.clone());
      if !fresh {
        warn!(source, identifier = %news.identifier, "dropping duplicate news item");
      }
      fresh
    })
    .collect()
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// A parsed catalog document and the apps that survived validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Source {
  pub name:          String,
  pub subtitle:      Option<String>,
  pub description:   Option<String>,
  pub icon_url:      Option<String>,
  pub header_url:    Option<String>,
  pub website:       Option<String>,
  pub fedi_username: Option<String>,
  pub patreon_url:   Option<String>,
  pub tint_color:    Option<String>,
  /// Curated bundle identifiers.
  pub featured_apps: Option<Vec<String>>,
  pub apps:          Vec<App>,
  pub news:          Vec<News>,
}

impl Source {
  /// Validate a raw document.
  ///
  /// Fails with [`Error::InvalidApps`] when the document declares no apps and
  /// with [`Error::InvalidName`] when it has no name. Individual apps that
  /// fail validation are dropped and logged, so a source whose declared apps
  /// are *all* invalid is still built, with an empty app list.
  pub fn from_raw(raw: RawSource, options: &ParseOptions) -> Result<Self> {
    let declared = match raw.apps {
      Some(apps) if !apps.is_empty() => apps,
      _ => return Err(Error::InvalidApps { name: raw.name }),
    };
    let name = raw
      .name
      .filter(|n| !n.trim().is_empty())
      .ok_or(Error::InvalidName)?;

    let declared_count = declared.len();
    let mut apps = Vec::with_capacity(declared_count);
    for entry in declared {
      match App::from_value(entry, options) {
        Ok(app) => apps.push(app),
        Err(e) => warn!(source = %name, error = %e, "dropping app"),
      }
    }
    debug!(
      source = %name,
      declared = declared_count,
      kept = apps.len(),
      "built source"
    );

    let news = collect_news(raw.news.unwrap_or_default(), &name);

    Ok(Self {
      subtitle: raw.subtitle,
      description: raw.description,
      icon_url: raw.icon_url,
      header_url: raw.header_url,
      website: raw.website,
      fedi_username: raw.fedi_username,
      patreon_url: raw.patreon_url,
      tint_color: raw.tint_color,
      featured_apps: raw.featured_apps,
      apps,
      news,
      name,
    })
  }

  /// Build from an untyped JSON document; anything but an object is rejected.
  pub fn from_value(value: Value, options: &ParseOptions) -> Result<Self> {
    if !value.is_object() {
      return Err(Error::NotAnObject("source"));
    }
    Self::from_raw(serde_json::from_value(value)?, options)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
