//! Cross-source merge: one app per bundle identifier, freshest wins.
//!
//! Pipeline:
//!   apps from every source
//!     └─ merge()       → exclude empty / marketplace-variant apps,
//!                        keep the latest-updated app per bundle identifier
//!          └─ partition() → primary / flagged, each newest-first
//!
//! The result depends only on the input apps and their order; there is no
//! clock, randomness or I/O involved.

use std::{
  cmp::Reverse,
  collections::{BTreeMap, btree_map::Entry},
};

use serde::Deserialize;

use crate::app::App;

// ─── Classification ──────────────────────────────────────────────────────────

/// Decides whether a merged app belongs in the flagged catalog.
pub trait Classifier {
  fn is_flagged(&self, app: &App) -> bool;
}

impl<F> Classifier for F
where
  F: Fn(&App) -> bool,
{
  fn is_flagged(&self, app: &App) -> bool { self(app) }
}

/// Flags apps by subtitle prefix or exact developer name. The default policy
/// flags nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlagPolicy {
  pub subtitle_prefixes: Vec<String>,
  pub developer_names:   Vec<String>,
}

impl Classifier for FlagPolicy {
  fn is_flagged(&self, app: &App) -> bool {
    let by_subtitle = app.subtitle.as_deref().is_some_and(|subtitle| {
      self
        .subtitle_prefixes
        .iter()
        .any(|p| !p.is_empty() && subtitle.starts_with(p.as_str()))
    });
    by_subtitle || self.developer_names.iter().any(|d| *d == app.developer_name)
  }
}

// ─── Merge ───────────────────────────────────────────────────────────────────

/// Counters describing what [`merge`] did with its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
  pub considered:           usize,
  /// Apps with no effective versions.
  pub without_versions:     usize,
  pub marketplace_variants: usize,
  /// Apps that shared a bundle identifier with an earlier candidate,
  /// whichever of the two ended up kept.
  pub duplicates:           usize,
}

/// The merged catalog: exactly one app per bundle identifier.
#[derive(Debug, Clone, Default)]
pub struct MergedCatalog {
  apps:      BTreeMap<String, App>,
  pub stats: MergeStats,
}

impl MergedCatalog {
  pub fn get(&self, bundle_identifier: &str) -> Option<&App> {
    self.apps.get(bundle_identifier)
  }

  pub fn len(&self) -> usize { self.apps.len() }

  pub fn is_empty(&self) -> bool { self.apps.is_empty() }

  /// Apps in bundle-identifier order.
  pub fn iter(&self) -> impl Iterator<Item = &App> { self.apps.values() }

  /// All apps, newest first.
  pub fn into_sorted(self) -> Vec<App> {
    let mut apps: Vec<App> = self.apps.into_values().collect();
    sort_newest_first(&mut apps);
    apps
  }

  /// Split into primary and flagged apps. Every app lands in exactly one of
  /// the two lists.
  pub fn partition<C>(self, classifier: &C) -> Partition
  where
    C: Classifier + ?Sized,
  {
    let (mut flagged, mut primary): (Vec<App>, Vec<App>) = self
      .apps
      .into_values()
      .partition(|app| classifier.is_flagged(app));
    sort_newest_first(&mut primary);
    sort_newest_first(&mut flagged);
    Partition { primary, flagged }
  }
}

/// Two disjoint catalogs, each sorted newest first.
#[derive(Debug, Clone, Default)]
pub struct Partition {
  pub primary: Vec<App>,
  pub flagged: Vec<App>,
}

/// Newest `last_updated` first; ties in bundle-identifier order.
pub fn sort_newest_first(apps: &mut [App]) {
  apps.sort_by_cached_key(|app| {
    (Reverse(app.last_updated()), app.bundle_identifier.clone())
  });
}

/// Collapse apps from all sources into one app per bundle identifier.
///
/// Apps without versions and marketplace variants are excluded. Among the
/// rest, the app with the greatest [`App::last_updated`] wins; on a tie the
/// first candidate seen is kept.
pub fn merge<I>(apps: I) -> MergedCatalog
where
  I: IntoIterator<Item = App>,
{
  let mut stats = MergeStats::default();
  let mut winners: BTreeMap<String, App> = BTreeMap::new();

  for app in apps {
    stats.considered += 1;
    if app.latest_version().is_none() {
      stats.without_versions += 1;
      continue;
    }
    if app.marketplace_variant {
      stats.marketplace_variants += 1;
      continue;
    }

    match winners.entry(app.bundle_identifier.clone()) {
      Entry::Vacant(slot) => {
        slot.insert(app);
      }
      Entry::Occupied(mut slot) => {
        stats.duplicates += 1;
        if app.last_updated() > slot.get().last_updated() {
          slot.insert(app);
        }
      }
    }
  }

  MergedCatalog {
    apps: winners,
    stats,
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
