//! Run configuration, layered from an optional TOML file and `ALTMERGE_*`
//! environment variables.

use std::path::{Path, PathBuf};

use altmerge_core::{
  DEFAULT_ICON_URL, ParseOptions, app::App, merge::FlagPolicy, source::Source,
};
use anyhow::Context as _;
use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
  /// Manually curated source URLs, one per line.
  pub urls_file:            PathBuf,
  pub output_dir:           PathBuf,
  pub primary_file:         String,
  pub flagged_file:         String,
  /// Per-request timeout.
  pub request_timeout_secs: u64,
  pub user_agent:           String,
  pub default_icon_url:     String,
  pub catalog:              CatalogConfig,
  pub discovery:            DiscoveryConfig,
  pub flagging:             FlagPolicy,
}

impl Default for HarvestConfig {
  fn default() -> Self {
    Self {
      urls_file:            PathBuf::from("urls.txt"),
      output_dir:           PathBuf::from("."),
      primary_file:         "repo.json".to_string(),
      flagged_file:         "flagged.json".to_string(),
      request_timeout_secs: 30,
      user_agent:           concat!("altmerge/", env!("CARGO_PKG_VERSION"))
        .to_string(),
      default_icon_url:     DEFAULT_ICON_URL.to_string(),
      catalog:              CatalogConfig::default(),
      discovery:            DiscoveryConfig::default(),
      flagging:             FlagPolicy::default(),
    }
  }
}

impl HarvestConfig {
  pub fn parse_options(&self) -> ParseOptions {
    ParseOptions {
      default_icon_url: self.default_icon_url.clone(),
    }
  }

  pub fn primary_path(&self) -> PathBuf { self.output_dir.join(&self.primary_file) }

  pub fn flagged_path(&self) -> PathBuf { self.output_dir.join(&self.flagged_file) }
}

/// Metadata for the catalogs this tool publishes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
  pub name:          String,
  pub subtitle:      Option<String>,
  pub description:   Option<String>,
  pub icon_url:      Option<String>,
  pub header_url:    Option<String>,
  pub website:       Option<String>,
  pub fedi_username: Option<String>,
  pub patreon_url:   Option<String>,
  pub tint_color:    Option<String>,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      name:          "Unified Source".to_string(),
      subtitle:      Some("Every source I could find, united.".to_string()),
      description:   Some(
        "Apps gathered from every known source, one entry per app, always \
         the freshest version."
          .to_string(),
      ),
      icon_url:      None,
      header_url:    None,
      website:       None,
      fedi_username: None,
      patreon_url:   None,
      tint_color:    None,
    }
  }
}

impl CatalogConfig {
  /// A publishable source carrying `apps` under this metadata.
  pub fn to_source(&self, apps: Vec<App>) -> Source {
    Source {
      name: self.name.clone(),
      subtitle: self.subtitle.clone(),
      description: self.description.clone(),
      icon_url: self.icon_url.clone(),
      header_url: self.header_url.clone(),
      website: self.website.clone(),
      fedi_username: self.fedi_username.clone(),
      patreon_url: self.patreon_url.clone(),
      tint_color: self.tint_color.clone(),
      featured_apps: None,
      apps,
      news: Vec::new(),
    }
  }
}

/// Directory services that list candidate source URLs. Unset channels are
/// skipped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
  /// JSON listing shaped `{"data": [{"url": ..}]}`.
  pub appdb_url: Option<String>,
  /// HTML page embedding `const defaultRepos = [..];`.
  pub choco_url: Option<String>,
}

// ─── Loading ──────────────────────────────────────────────────────────────────

/// Read `path` (if it exists) and overlay `ALTMERGE_*` environment variables;
/// nested keys use `__`, e.g. `ALTMERGE_CATALOG__NAME`.
pub fn load(path: &Path) -> anyhow::Result<HarvestConfig> {
  let settings = ::config::Config::builder()
    .add_source(::config::File::from(path).required(false))
    .add_source(
      ::config::Environment::with_prefix("ALTMERGE")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise HarvestConfig")
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.primary_file, "repo.json");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert!(cfg.discovery.appdb_url.is_none());
    assert_eq!(cfg.flagging, FlagPolicy::default());
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("altmerge.toml");
    std::fs::write(
      &path,
      r#"
        output_dir = "out"
        request_timeout_secs = 5

        [catalog]
        name = "Mine"
        website = "https://example.com"

        [discovery]
        appdb_url = "https://directory.example.com/repos"

        [flagging]
        subtitle_prefixes = ["[DUPE]"]
        developer_names = ["Spammer"]
      "#,
    )
    .unwrap();

    let cfg = load(&path).unwrap();
    assert_eq!(cfg.primary_path(), PathBuf::from("out/repo.json"));
    assert_eq!(cfg.request_timeout_secs, 5);
    assert_eq!(cfg.catalog.name, "Mine");
    assert_eq!(cfg.catalog.website.as_deref(), Some("https://example.com"));
    assert!(cfg.catalog.subtitle.is_some());
    assert_eq!(
      cfg.discovery.appdb_url.as_deref(),
      Some("https://directory.example.com/repos")
    );
    assert_eq!(cfg.flagging.subtitle_prefixes, vec!["[DUPE]".to_string()]);
    assert_eq!(cfg.flagging.developer_names, vec!["Spammer".to_string()]);
  }

  #[test]
  fn catalog_source_has_no_news_or_features() {
    let source = CatalogConfig::default().to_source(Vec::new());
    assert_eq!(source.name, "Unified Source");
    assert!(source.news.is_empty());
    assert!(source.featured_apps.is_none());
  }
}
