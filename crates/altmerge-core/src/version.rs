//! Version records: one downloadable release of an app.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::{
  Error, Result,
  raw::RawVersion,
  timestamp::{self, Instant},
};

/// One release of an app. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
  /// Not unique across an app's raw versions; see
  /// [`App::effective_versions`](crate::app::App::effective_versions).
  pub version:               String,
  pub build_version:         Option<String>,
  pub marketing_version:     Option<String>,
  pub date:                  Instant,
  pub localized_description: Option<String>,
  pub download_url:          String,
  pub size:                  u64,
  pub asset_urls:            Option<BTreeMap<String, String>>,
  pub min_os_version:        Option<String>,
  pub max_os_version:        Option<String>,
}

impl Version {
  /// Validate a raw entry. `version`, `date`, `downloadURL` and `size` are
  /// required; the date must survive [`timestamp::normalize`].
  pub fn from_raw(raw: RawVersion) -> Result<Self> {
    let version = raw.version.ok_or(missing("version"))?;
    let download_url = raw.download_url.ok_or(missing("downloadURL"))?;
    let size = raw.size.ok_or(missing("size"))?;
    let date = timestamp::normalize(&raw.date.ok_or(missing("date"))?)?;

    Ok(Self {
      version,
      build_version: raw.build_version,
      marketing_version: raw.marketing_version,
      date,
      localized_description: raw.localized_description,
      download_url,
      size,
      asset_urls: raw.asset_urls,
      min_os_version: raw.min_os_version,
      max_os_version: raw.max_os_version,
    })
  }

  /// Build from an untyped JSON entry; anything but an object is rejected.
  pub fn from_value(value: Value) -> Result<Self> {
    if !value.is_object() {
      return Err(Error::NotAnObject("version"));
    }
    Self::from_raw(serde_json::from_value(value)?)
  }
}

fn missing(field: &'static str) -> Error {
  Error::MissingField {
    record: "version",
    field,
  }
}
