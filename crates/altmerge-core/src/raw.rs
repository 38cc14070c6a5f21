//! Raw, loosely-typed shapes of catalog documents as they appear in the wild.
//!
//! Nothing here fails on a wrongly-typed optional field: such fields read as
//! absent. Validation happens when the raw shapes are turned into records
//! (see [`crate::source::Source::from_raw`]).

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

// ─── Raw documents ───────────────────────────────────────────────────────────

/// A catalog document before validation.
///
/// Apps and news items stay as untyped JSON so that one malformed entry
/// cannot fail the whole document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSource {
  #[serde(default, deserialize_with = "de::text")]
  pub name:          Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub subtitle:      Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub description:   Option<String>,
  #[serde(default, rename = "iconURL", deserialize_with = "de::text")]
  pub icon_url:      Option<String>,
  #[serde(default, rename = "headerURL", deserialize_with = "de::text")]
  pub header_url:    Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub website:       Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub fedi_username: Option<String>,
  #[serde(default, rename = "patreonURL", deserialize_with = "de::text")]
  pub patreon_url:   Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub tint_color:    Option<String>,
  #[serde(default, deserialize_with = "de::lenient")]
  pub featured_apps: Option<Vec<String>>,
  #[serde(default, deserialize_with = "de::lenient")]
  pub apps:          Option<Vec<Value>>,
  #[serde(default, deserialize_with = "de::lenient")]
  pub news:          Option<Vec<Value>>,
}

/// One app entry before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawApp {
  #[serde(default, deserialize_with = "de::text")]
  pub name:                  Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub bundle_identifier:     Option<String>,
  #[serde(default, rename = "marketplaceID", deserialize_with = "de::text")]
  pub marketplace_id:        Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub developer_name:        Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub subtitle:              Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub localized_description: Option<String>,
  #[serde(default, rename = "iconURL", deserialize_with = "de::text")]
  pub icon_url:              Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub tint_color:            Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub category:              Option<String>,
  #[serde(default)]
  pub screenshots:           Option<Value>,
  #[serde(default, deserialize_with = "de::lenient")]
  pub versions:              Option<Vec<Value>>,
  #[serde(default)]
  pub app_permissions:       Option<Value>,
  #[serde(default)]
  pub patreon:               Option<Value>,
}

/// One version entry before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVersion {
  #[serde(default, deserialize_with = "de::text")]
  pub version:               Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub build_version:         Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub marketing_version:     Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub date:                  Option<String>,
  #[serde(default, deserialize_with = "de::text")]
  pub localized_description: Option<String>,
  #[serde(default, rename = "downloadURL", deserialize_with = "de::text")]
  pub download_url:          Option<String>,
  #[serde(default, deserialize_with = "de::byte_size")]
  pub size:                  Option<u64>,
  #[serde(default, rename = "assetURLs", deserialize_with = "de::lenient")]
  pub asset_urls:            Option<BTreeMap<String, String>>,
  #[serde(default, rename = "minOSVersion", deserialize_with = "de::text")]
  pub min_os_version:        Option<String>,
  #[serde(default, rename = "maxOSVersion", deserialize_with = "de::text")]
  pub max_os_version:        Option<String>,
}

// ─── Field deserializers ─────────────────────────────────────────────────────

/// Deserializers that never reject a document over a field's JSON type.
pub(crate) mod de {
  use serde::{Deserialize, Deserializer, de::DeserializeOwned, de::Error as _};
  use serde_json::Value;

  /// Keep the value only if it has the expected shape.
  pub(crate) fn lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
  where
    D: Deserializer<'de>,
    T: DeserializeOwned,
  {
    let value = Value::deserialize(de)?;
    Ok(serde_json::from_value(value).ok())
  }

  /// Strings as-is; numbers and booleans rendered to text.
  pub(crate) fn text<'de, D>(de: D) -> Result<Option<String>, D::Error>
  where
    D: Deserializer<'de>,
  {
    Ok(as_text(Value::deserialize(de)?))
  }

  /// Like [`text`], but the field must be present and non-empty.
  pub(crate) fn required_text<'de, D>(de: D) -> Result<String, D::Error>
  where
    D: Deserializer<'de>,
  {
    as_text(Value::deserialize(de)?)
      .filter(|s| !s.trim().is_empty())
      .ok_or_else(|| D::Error::custom("expected a non-empty string"))
  }

  /// Byte counts: integers, floats (truncated) and numeric strings.
  pub(crate) fn byte_size<'de, D>(de: D) -> Result<Option<u64>, D::Error>
  where
    D: Deserializer<'de>,
  {
    Ok(match Value::deserialize(de)? {
      Value::Number(n) => n.as_u64().or_else(|| float_size(n.as_f64())),
      Value::String(s) => {
        let s = s.trim();
        s.parse::<u64>().ok().or_else(|| float_size(s.parse().ok()))
      }
      _ => None,
    })
  }

  /// Small unsigned integers (screenshot dimensions and the like).
  pub(crate) fn dimension<'de, D>(de: D) -> Result<Option<u32>, D::Error>
  where
    D: Deserializer<'de>,
  {
    Ok(byte_size(de)?.and_then(|n| u32::try_from(n).ok()))
  }

  pub(crate) fn as_text(value: Value) -> Option<String> {
    match value {
      Value::String(s) => Some(s),
      Value::Number(n) => Some(n.to_string()),
      Value::Bool(b) => Some(b.to_string()),
      _ => None,
    }
  }

  fn float_size(f: Option<f64>) -> Option<u64> {
    f.filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
