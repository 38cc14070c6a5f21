//! Projection of records into the published catalog schema.
//!
//! Every schema key is always present and absent optionals serialise as
//! `null`; screenshot dimensions are the exception and are left out.
//! Versions are the de-duplicated, newest-first view of each app.

use std::collections::BTreeMap;

use altmerge_core::{
  app::{App, Category, Patreon, Permissions, Screenshot},
  source::{News, Source},
  version::Version,
};
use chrono::SecondsFormat;
use serde::Serialize;

// ─── Documents ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument<'a> {
  pub name:          &'a str,
  pub subtitle:      Option<&'a str>,
  pub description:   Option<&'a str>,
  #[serde(rename = "iconURL")]
  pub icon_url:      Option<&'a str>,
  #[serde(rename = "headerURL")]
  pub header_url:    Option<&'a str>,
  pub website:       Option<&'a str>,
  pub fedi_username: Option<&'a str>,
  #[serde(rename = "patreonURL")]
  pub patreon_url:   Option<&'a str>,
  pub tint_color:    Option<&'a str>,
  pub featured_apps: Option<&'a [String]>,
  pub apps:          Vec<AppDocument<'a>>,
  pub news:          &'a [News],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDocument<'a> {
  pub name:                  &'a str,
  pub bundle_identifier:     &'a str,
  #[serde(rename = "marketplaceID")]
  pub marketplace_id:        Option<&'a str>,
  pub developer_name:        &'a str,
  pub subtitle:              Option<&'a str>,
  pub localized_description: &'a str,
  #[serde(rename = "iconURL")]
  pub icon_url:              &'a str,
  pub tint_color:            Option<&'a str>,
  pub category:              Option<Category>,
  pub screenshots:           Option<&'a [Screenshot]>,
  pub versions:              Vec<VersionDocument<'a>>,
  pub app_permissions:       &'a Permissions,
  pub patreon:               Option<&'a Patreon>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDocument<'a> {
  pub version:               &'a str,
  pub build_version:         Option<&'a str>,
  pub marketing_version:     Option<&'a str>,
  /// ISO-8601 with the reference-zone offset.
  pub date:                  String,
  pub localized_description: Option<&'a str>,
  #[serde(rename = "downloadURL")]
  pub download_url:          &'a str,
  pub size:                  u64,
  #[serde(rename = "assetURLs")]
  pub asset_urls:            Option<&'a BTreeMap<String, String>>,
  #[serde(rename = "minOSVersion")]
  pub min_os_version:        Option<&'a str>,
  #[serde(rename = "maxOSVersion")]
  pub max_os_version:        Option<&'a str>,
}

// ─── Projections ─────────────────────────────────────────────────────────────

impl<'a> From<&'a Version> for VersionDocument<'a> {
  fn from(v: &'a Version) -> Self {
    Self {
      version:               &v.version,
      build_version:         v.build_version.as_deref(),
      marketing_version:     v.marketing_version.as_deref(),
      date:                  v.date.to_rfc3339_opts(SecondsFormat::AutoSi, false),
      localized_description: v.localized_description.as_deref(),
      download_url:          &v.download_url,
      size:                  v.size,
      asset_urls:            v.asset_urls.as_ref(),
      min_os_version:        v.min_os_version.as_deref(),
      max_os_version:        v.max_os_version.as_deref(),
    }
  }
}

impl<'a> From<&'a App> for AppDocument<'a> {
  fn from(app: &'a App) -> Self {
    Self {
      name:                  &app.name,
      bundle_identifier:     &app.bundle_identifier,
      marketplace_id:        app.marketplace_id.as_deref(),
      developer_name:        &app.developer_name,
      subtitle:              app.subtitle.as_deref(),
      localized_description: &app.localized_description,
      icon_url:              &app.icon_url,
      tint_color:            app.tint_color.as_deref(),
      category:              app.category,
      screenshots:           app.screenshots.as_deref(),
      versions:              app
        .effective_versions()
        .into_iter()
        .map(VersionDocument::from)
        .collect(),
      app_permissions:       &app.app_permissions,
      patreon:               app.patreon.as_ref(),
    }
  }
}

impl<'a> From<&'a Source> for SourceDocument<'a> {
  fn from(source: &'a Source) -> Self {
    Self {
      name:          &source.name,
      subtitle:      source.subtitle.as_deref(),
      description:   source.description.as_deref(),
      icon_url:      source.icon_url.as_deref(),
      header_url:    source.header_url.as_deref(),
      website:       source.website.as_deref(),
      fedi_username: source.fedi_username.as_deref(),
      patreon_url:   source.patreon_url.as_deref(),
      tint_color:    source.tint_color.as_deref(),
      featured_apps: source.featured_apps.as_deref(),
      apps:          source.apps.iter().map(AppDocument::from).collect(),
      news:          &source.news,
    }
  }
}
