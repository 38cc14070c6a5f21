//! App records and their value types.
//!
//! An app owns every version its document listed, in document order. The
//! de-duplicated, newest-first view is recomputed on read by
//! [`App::effective_versions`]; nothing derived is cached.

use std::{
  collections::{BTreeMap, HashSet},
  str::FromStr,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use tracing::warn;

use crate::{
  Error, ParseOptions, Result,
  raw::{RawApp, de},
  timestamp::{self, Instant},
  version::Version,
};

/// Developer name used when a document does not provide one.
pub const UNKNOWN_DEVELOPER: &str = "Unknown";

// ─── Value types ─────────────────────────────────────────────────────────────

/// The fixed set of store categories.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Category {
  Developer,
  Entertainment,
  Games,
  Lifestyle,
  Other,
  PhotoVideo,
  Social,
  Utilities,
}

/// A screenshot; bare URL strings in documents become `width`/`height`-less
/// screenshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
  #[serde(rename = "imageURL", deserialize_with = "de::required_text")]
  pub image_url: String,
  #[serde(
    default,
    deserialize_with = "de::dimension",
    skip_serializing_if = "Option::is_none"
  )]
  pub width:     Option<u32>,
  #[serde(
    default,
    deserialize_with = "de::dimension",
    skip_serializing_if = "Option::is_none"
  )]
  pub height:    Option<u32>,
}

impl Screenshot {
  /// Accepts a list of screenshots, or an object of per-device lists
  /// (`{"iphone": [..], "ipad": [..]}`), flattened in key order.
  fn list_from_value(value: Value) -> Option<Vec<Self>> {
    let entries: Vec<Value> = match value {
      Value::Array(items) => items,
      Value::Object(devices) => devices
        .into_iter()
        .filter_map(|(_, v)| match v {
          Value::Array(items) => Some(items),
          _ => None,
        })
        .flatten()
        .collect(),
      _ => return None,
    };

    Some(
      entries
        .into_iter()
        .filter_map(|entry| match entry {
          Value::String(url) if !url.trim().is_empty() => Some(Self {
            image_url: url,
            width:     None,
            height:    None,
          }),
          Value::Object(_) => serde_json::from_value(entry).ok(),
          _ => None,
        })
        .collect(),
    )
  }
}

/// Entitlements and privacy usage descriptions an app declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
  pub entitlements: Vec<String>,
  pub privacy:      BTreeMap<String, String>,
}

impl Permissions {
  /// Entitlements may be strings or `{"name": ..}` objects; privacy may be a
  /// mapping or a list of `{"name", "usageDescription"}` objects.
  fn from_value(value: Value) -> Self {
    let Value::Object(mut map) = value else {
      return Self::default();
    };

    let entitlements = match map.remove("entitlements") {
      Some(Value::Array(items)) => items
        .into_iter()
        .filter_map(|item| match item {
          Value::Object(mut obj) => obj.remove("name").and_then(de::as_text),
          other => de::as_text(other),
        })
        .collect(),
      _ => Vec::new(),
    };

    let privacy = match map.remove("privacy") {
      Some(Value::Object(obj)) => obj
        .into_iter()
        .filter_map(|(k, v)| de::as_text(v).map(|v| (k, v)))
        .collect(),
      Some(Value::Array(items)) => items
        .into_iter()
        .filter_map(|item| {
          let Value::Object(mut obj) = item else {
            return None;
          };
          let name = obj.remove("name").and_then(de::as_text)?;
          let usage = obj
            .remove("usageDescription")
            .and_then(de::as_text)
            .unwrap_or_default();
          Some((name, usage))
        })
        .collect(),
      _ => BTreeMap::new(),
    };

    Self {
      entitlements,
      privacy,
    }
  }
}

/// Monetisation metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patreon {
  #[serde(default, deserialize_with = "de::lenient")]
  pub pledge:   Option<f64>,
  #[serde(default, deserialize_with = "de::text")]
  pub currency: Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub benefit:  Option<String>,
  #[serde(default, deserialize_with = "de::lenient")]
  pub tiers:    Option<Vec<String>>,
}

// ─── App ─────────────────────────────────────────────────────────────────────

/// One app, identified by its bundle identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct App {
  pub name:                  String,
  /// Identity key across sources; never empty.
  pub bundle_identifier:     String,
  pub marketplace_id:        Option<String>,
  /// Set when the entry targets an alternative marketplace
  /// (`marketplaceID` present) rather than offering a direct download.
  pub marketplace_variant:   bool,
  pub developer_name:        String,
  pub subtitle:              Option<String>,
  pub localized_description: String,
  pub icon_url:              String,
  pub tint_color:            Option<String>,
  pub category:              Option<Category>,
  pub screenshots:           Option<Vec<Screenshot>>,
  pub app_permissions:       Permissions,
  pub patreon:               Option<Patreon>,
  versions:                  Vec<Version>,
}

impl App {
  /// Validate a raw entry and build its versions.
  ///
  /// Fails with [`Error::InvalidBundleIdentifier`] when `bundleIdentifier` is
  /// missing or empty. A version that cannot be built is skipped and logged;
  /// the app keeps its remaining versions.
  pub fn from_raw(raw: RawApp, options: &ParseOptions) -> Result<Self> {
    let Some(bundle_identifier) = raw
      .bundle_identifier
      .filter(|id| !id.is_empty())
    else {
      return Err(Error::InvalidBundleIdentifier { name: raw.name });
    };
    let name = raw.name.ok_or(Error::MissingField {
      record: "app",
      field:  "name",
    })?;

    let mut versions = Vec::new();
    for entry in raw.versions.unwrap_or_default() {
      match Version::from_value(entry) {
        Ok(v) => versions.push(v),
        Err(e) => warn!(
          bundle_id = %bundle_identifier,
          error = %e,
          "skipping version"
        ),
      }
    }

    let marketplace_id = raw.marketplace_id.filter(|id| !id.is_empty());

    Ok(Self {
      localized_description: raw
        .localized_description
        .unwrap_or_else(|| name.clone()),
      name,
      bundle_identifier,
      marketplace_variant: marketplace_id.is_some(),
      marketplace_id,
      developer_name: raw
        .developer_name
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| UNKNOWN_DEVELOPER.to_string()),
      subtitle: raw.subtitle,
      icon_url: raw
        .icon_url
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| options.default_icon_url.clone()),
      tint_color: raw.tint_color,
      category: raw
        .category
        .and_then(|c| Category::from_str(&c.to_ascii_lowercase()).ok()),
      screenshots: raw.screenshots.and_then(Screenshot::list_from_value),
      app_permissions: raw
        .app_permissions
        .map(Permissions::from_value)
        .unwrap_or_default(),
      patreon: raw.patreon.and_then(|p| serde_json::from_value(p).ok()),
      versions,
    })
  }

  /// Build from an untyped JSON entry; anything but an object is rejected.
  pub fn from_value(value: Value, options: &ParseOptions) -> Result<Self> {
    if !value.is_object() {
      return Err(Error::NotAnObject("app"));
    }
    Self::from_raw(serde_json::from_value(value)?, options)
  }

  /// Every version as listed in the document, duplicates included.
  pub fn all_versions(&self) -> &[Version] { &self.versions }

  /// One version per distinct version string, newest first. Among versions
  /// sharing a string the latest release date wins; equal dates keep
  /// document order.
  pub fn effective_versions(&self) -> Vec<&Version> {
    let mut sorted: Vec<&Version> = self.versions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let mut seen = HashSet::new();
    sorted.retain(|v| seen.insert(v.version.as_str()));
    sorted
  }

  /// The head of [`effective_versions`](Self::effective_versions), found
  /// without sorting.
  pub fn latest_version(&self) -> Option<&Version> {
    self
      .versions
      .iter()
      .reduce(|best, v| if v.date > best.date { v } else { best })
  }

  /// Release date of the latest version, or the epoch when there is none.
  pub fn last_updated(&self) -> Instant {
    self
      .latest_version()
      .map_or_else(timestamp::epoch, |v| v.date)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;

  fn app(value: Value) -> Result<App> {
    App::from_value(value, &ParseOptions::default())
  }

  fn version(v: &str, date: &str) -> Value {
    json!({
      "version": v,
      "date": date,
      "downloadURL": format!("https://example.com/{v}.ipa"),
      "size": 10,
    })
  }

  // ── Bundle identifier gate ──────────────────────────────────────────────

  #[test]
  fn empty_bundle_identifier_is_rejected() {
    let err = app(json!({ "bundleIdentifier": "", "name": "X" })).unwrap_err();
    assert!(
      matches!(err, Error::InvalidBundleIdentifier { name } if name.as_deref() == Some("X"))
    );
  }

  #[test]
  fn missing_bundle_identifier_is_rejected() {
    let err = app(json!({ "name": "X" })).unwrap_err();
    assert!(matches!(err, Error::InvalidBundleIdentifier { .. }));
  }

  #[test]
  fn only_empty_bundle_identifier_is_rejected() {
    let a = app(json!({ "bundleIdentifier": " ", "name": "X" })).unwrap();
    assert_eq!(a.bundle_identifier, " ");
  }

  #[test]
  fn app_without_versions_is_valid_but_empty() {
    let a = app(json!({ "bundleIdentifier": "com.x.y", "name": "X" })).unwrap();
    assert!(a.effective_versions().is_empty());
    assert!(a.latest_version().is_none());
    assert_eq!(a.last_updated(), timestamp::epoch());
  }

  #[test]
  fn missing_name_is_rejected() {
    let err = app(json!({ "bundleIdentifier": "com.x.y" })).unwrap_err();
    assert!(matches!(err, Error::MissingField { field: "name", .. }));
  }

  // ── Defaults ────────────────────────────────────────────────────────────

  #[test]
  fn defaults_are_applied() {
    let a = app(json!({
      "bundleIdentifier": "com.x.y",
      "name": "X",
      "iconURL": "",
    }))
    .unwrap();
    assert_eq!(a.developer_name, UNKNOWN_DEVELOPER);
    assert_eq!(a.localized_description, "X");
    assert_eq!(a.icon_url, crate::DEFAULT_ICON_URL);
    assert_eq!(a.app_permissions, Permissions::default());
    assert!(!a.marketplace_variant);
  }

  #[test]
  fn custom_default_icon() {
    let options = ParseOptions {
      default_icon_url: "https://example.com/icon.png".into(),
    };
    let a = App::from_value(
      json!({ "bundleIdentifier": "com.x.y", "name": "X" }),
      &options,
    )
    .unwrap();
    assert_eq!(a.icon_url, "https://example.com/icon.png");
  }

  #[test]
  fn marketplace_id_marks_variant() {
    let a = app(json!({
      "bundleIdentifier": "com.x.y",
      "name": "X",
      "marketplaceID": "123456",
    }))
    .unwrap();
    assert!(a.marketplace_variant);
    assert_eq!(a.marketplace_id.as_deref(), Some("123456"));
  }

  #[test]
  fn category_is_matched_against_fixed_set() {
    let a = app(json!({
      "bundleIdentifier": "com.x.y",
      "name": "X",
      "category": "Photo-Video",
    }))
    .unwrap();
    assert_eq!(a.category, Some(Category::PhotoVideo));
    assert_eq!(Category::PhotoVideo.as_ref(), "photo-video");

    let b = app(json!({
      "bundleIdentifier": "com.x.y",
      "name": "X",
      "category": "weather",
    }))
    .unwrap();
    assert_eq!(b.category, None);
  }

  #[test]
  fn screenshots_accept_urls_objects_and_device_maps() {
    let a = app(json!({
      "bundleIdentifier": "com.x.y",
      "name": "X",
      "screenshots": {
        "ipad": [{ "imageURL": "https://e.com/b.png", "width": 2048, "height": 1536 }],
        "iphone": ["https://e.com/a.png", 5, { "width": 3 }],
      },
    }))
    .unwrap();
    let shots = a.screenshots.unwrap();
    assert_eq!(shots.len(), 2);
    assert_eq!(shots[0].width, Some(2048));
    assert_eq!(shots[1].image_url, "https://e.com/a.png");
  }

  #[test]
  fn permissions_normalise_both_layouts() {
    let a = app(json!({
      "bundleIdentifier": "com.x.y",
      "name": "X",
      "appPermissions": {
        "entitlements": ["com.apple.developer.networking", { "name": "get-task-allow" }],
        "privacy": [
          { "name": "NSCameraUsageDescription", "usageDescription": "Scanning" },
        ],
      },
    }))
    .unwrap();
    assert_eq!(a.app_permissions.entitlements, vec![
      "com.apple.developer.networking".to_string(),
      "get-task-allow".to_string(),
    ]);
    assert_eq!(
      a.app_permissions.privacy.get("NSCameraUsageDescription").map(String::as_str),
      Some("Scanning")
    );

    let b = app(json!({
      "bundleIdentifier": "com.x.y",
      "name": "X",
      "appPermissions": { "privacy": { "NSMicrophoneUsageDescription": "Calls" } },
    }))
    .unwrap();
    assert!(b.app_permissions.entitlements.is_empty());
    assert_eq!(b.app_permissions.privacy.len(), 1);
  }

  #[test]
  fn malformed_patreon_is_dropped() {
    let a = app(json!({
      "bundleIdentifier": "com.x.y",
      "name": "X",
      "patreon": "yes please",
    }))
    .unwrap();
    assert!(a.patreon.is_none());

    let b = app(json!({
      "bundleIdentifier": "com.x.y",
      "name": "X",
      "patreon": { "pledge": 5, "currency": "USD", "tiers": "gold" },
    }))
    .unwrap();
    let p = b.patreon.unwrap();
    assert_eq!(p.pledge, Some(5.0));
    assert_eq!(p.currency.as_deref(), Some("USD"));
    assert!(p.tiers.is_none());
  }

  // ── Versions ────────────────────────────────────────────────────────────

  #[test]
  fn duplicate_version_strings_keep_latest() {
    let a = app(json!({
      "bundleIdentifier": "com.x.y",
      "name": "X",
      "versions": [
        version("1.0", "2023-01-01"),
        version("1.0", "2023-03-01"),
        version("0.9", "2022-12-01"),
      ],
    }))
    .unwrap();
    let effective = a.effective_versions();
    assert_eq!(effective.len(), 2);
    assert_eq!(effective[0].version, "1.0");
    assert_eq!(effective[0].date, timestamp::normalize("2023-03-01").unwrap());
    assert_eq!(effective[1].version, "0.9");
    assert_eq!(a.all_versions().len(), 3);
  }

  #[test]
  fn equal_dates_keep_document_order() {
    let mut first = version("2.0", "2023-01-01");
    first["downloadURL"] = json!("https://example.com/first.ipa");
    let a = app(json!({
      "bundleIdentifier": "com.x.y",
      "name": "X",
      "versions": [first, version("2.0", "2023-01-01")],
    }))
    .unwrap();
    let effective = a.effective_versions();
    assert_eq!(effective.len(), 1);
    assert_eq!(effective[0].download_url, "https://example.com/first.ipa");
  }

  #[test]
  fn last_updated_is_newest_release() {
    let a = app(json!({
      "bundleIdentifier": "com.x.y",
      "name": "X",
      "versions": [
        version("1.1", "2023-02-01"),
        version("1.2", "2023-03-01"),
        version("1.0", "2023-01-01"),
      ],
    }))
    .unwrap();
    assert_eq!(a.last_updated(), timestamp::normalize("2023-03-01").unwrap());
    assert_eq!(a.latest_version().unwrap().version, "1.2");
    assert_eq!(a.effective_versions()[0].version, "1.2");
  }

  #[test]
  fn bad_version_is_skipped_not_fatal() {
    let a = app(json!({
      "bundleIdentifier": "com.x.y",
      "name": "X",
      "versions": [
        version("1.0", "not a date"),
        { "version": "1.1" },
        "garbage",
        version("1.2", "2023-03-01"),
      ],
    }))
    .unwrap();
    assert_eq!(a.all_versions().len(), 1);
    assert_eq!(a.latest_version().unwrap().version, "1.2");
  }
}
