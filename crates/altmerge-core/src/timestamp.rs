//! Tolerant timestamp normalisation.
//!
//! Catalog authors write release dates in many shapes: `2023-2-17`,
//! `2023-02-17T12:00:00Z`, `2023-02-17 12:00:00+0500`, and so on. Every one
//! of them is folded into an [`Instant`] in [`REFERENCE_ZONE`], so ordering
//! between dates from different documents is well-defined.
//!
//! Resolution order:
//!   raw &str
//!     └─ ISO-8601 as-is
//!          └─ pre-cleaned ISO-8601 (Z → +00:00, zero-padded date, hour-only
//!             times and offsets completed, offset colon)
//!               └─ strict `YYYY-MM-DD` / `YYYYMMDD` on the date component
//!                    └─ Error::InvalidTimestamp

use std::sync::LazyLock;

use chrono::{
  DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
  Offset, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;
use regex::Regex;

use crate::{Error, Result};

/// Zone every [`Instant`] is expressed in. Timestamps that carry no offset are
/// read as wall-clock time in this zone rather than UTC.
pub const REFERENCE_ZONE: Tz = chrono_tz::America::New_York;

/// A timezone-aware point in time, canonicalised to [`REFERENCE_ZONE`].
pub type Instant = DateTime<Tz>;

/// The Unix epoch in the reference zone; the `last_updated` of an app with no
/// versions.
pub fn epoch() -> Instant {
  DateTime::<Utc>::default().with_timezone(&REFERENCE_ZONE)
}

// ─── ISO-8601 ────────────────────────────────────────────────────────────────

const AWARE_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f%:z",
  "%Y-%m-%dT%H:%M%:z",
  "%Y-%m-%d %H:%M:%S%.f%:z",
  "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%d %H:%M",
];

/// Extended form first, then the basic `YYYYMMDD` form.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// A time given as the hour alone, e.g. `12` or `12+05`.
static HOUR_ONLY: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(\d{2})([+-].*)?$").expect("hour pattern is valid")
});

/// A four-digit offset without a colon at the very end, e.g. `+0500`.
static BARE_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"([+-]\d{2})(\d{2})$").expect("offset pattern is valid")
});

/// An offset given as hours alone at the very end, e.g. `+05`.
static HOUR_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"([+-]\d{2})$").expect("offset pattern is valid")
});

enum Parsed {
  Aware(DateTime<FixedOffset>),
  Naive(NaiveDateTime),
}

fn parse_iso(s: &str) -> Option<Parsed> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(Parsed::Aware(dt));
  }
  for fmt in AWARE_FORMATS {
    if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
      return Some(Parsed::Aware(dt));
    }
  }
  for fmt in NAIVE_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
      return Some(Parsed::Naive(dt));
    }
  }
  parse_date(s)
}

fn parse_date(s: &str) -> Option<Parsed> {
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    .map(|d| Parsed::Naive(d.and_time(NaiveTime::MIN)))
}

// ─── Pre-cleaning ────────────────────────────────────────────────────────────

/// Zero-pad the month and day of a `-`-separated date. Components past the
/// third are dropped.
fn pad_date(date: &str) -> String {
  let parts: Vec<&str> = date.split('-').collect();
  if parts.len() >= 3 {
    format!("{}-{:0>2}-{:0>2}", parts[0], parts[1], parts[2])
  } else {
    date.to_string()
  }
}

/// Complete reduced-precision times and offsets: `12` → `12:00`,
/// `+0500` → `+05:00`, `+05` → `+05:00`.
fn clean_time(time: &str) -> String {
  let time = HOUR_ONLY.replace(time, "${1}:00${2}");
  let time = BARE_OFFSET.replace(&time, "${1}:${2}");
  HOUR_OFFSET.replace(&time, "${1}:00").into_owned()
}

/// Returns the cleaned timestamp together with its (padded) date component.
fn preclean(raw: &str) -> (String, String) {
  let trimmed = raw.trim();
  let s = match trimmed.strip_suffix('Z') {
    Some(head) => format!("{head}+00:00"),
    None => trimmed.to_string(),
  };

  let (date_part, time_part) = s
    .split_once('T')
    .or_else(|| s.split_once(' '))
    .unwrap_or((s.as_str(), ""));
  let date_part = pad_date(date_part);

  let cleaned = if time_part.is_empty() {
    date_part.clone()
  } else {
    format!("{date_part}T{}", clean_time(time_part))
  };
  (cleaned, date_part)
}

// ─── Zone resolution ─────────────────────────────────────────────────────────

fn localize(parsed: Parsed) -> Instant {
  match parsed {
    Parsed::Aware(dt) => dt.with_timezone(&REFERENCE_ZONE),
    Parsed::Naive(naive) => match REFERENCE_ZONE.from_local_datetime(&naive) {
      LocalResult::Single(dt) => dt,
      LocalResult::Ambiguous(earliest, _) => earliest,
      // Skipped by a forward DST transition: apply the offset in force just
      // before the gap.
      LocalResult::None => {
        let before = REFERENCE_ZONE
          .offset_from_utc_datetime(&(naive - TimeDelta::days(1)))
          .fix();
        let utc = naive - TimeDelta::seconds(i64::from(before.local_minus_utc()));
        utc.and_utc().with_timezone(&REFERENCE_ZONE)
      }
    },
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Normalise an arbitrary date/time string into an [`Instant`].
///
/// Values with an explicit offset are converted into the reference zone;
/// values without one are assumed to already be reference-zone wall-clock
/// time. Fails with [`Error::InvalidTimestamp`] when even the date component
/// cannot be read as `YYYY-MM-DD`.
pub fn normalize(raw: &str) -> Result<Instant> {
  if let Some(parsed) = parse_iso(raw) {
    return Ok(localize(parsed));
  }

  let (cleaned, date_part) = preclean(raw);
  parse_iso(&cleaned)
    .or_else(|| parse_date(&date_part))
    .map(localize)
    .ok_or_else(|| Error::InvalidTimestamp(raw.to_string()))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
  }

  fn offset_hours(instant: &Instant) -> i32 {
    instant.offset().fix().local_minus_utc() / 3600
  }

  #[test]
  fn date_only_is_reference_midnight() {
    let t = normalize("2023-02-17").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 2, 17, 5, 0));
    assert_eq!(offset_hours(&t), -5);
  }

  #[test]
  fn single_digit_month_and_day_are_padded() {
    let t = normalize("2023-2-7").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 2, 7, 5, 0));
  }

  #[test]
  fn zulu_is_converted_to_reference_zone() {
    let t = normalize("2023-06-01T12:00:00Z").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 6, 1, 12, 0));
    assert_eq!(offset_hours(&t), -4);
  }

  #[test]
  fn zulu_without_seconds() {
    let t = normalize("2023-06-01T12:30Z").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 6, 1, 12, 30));
  }

  #[test]
  fn colonless_offset_with_space_separator() {
    let t = normalize("2023-06-01 12:00:00+0530").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 6, 1, 6, 30));
  }

  #[test]
  fn padded_date_with_time_and_offset() {
    let t = normalize("2024-3-9T10:00:00-06:00").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2024, 3, 9, 16, 0));
  }

  #[test]
  fn hour_only_time_is_kept() {
    let t = normalize("2023-06-01T12").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 6, 1, 16, 0));

    let t = normalize("2023-06-01 12+02").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 6, 1, 10, 0));
  }

  #[test]
  fn hour_only_offset_is_honoured() {
    let t = normalize("2023-06-01T12:00:00+05").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 6, 1, 7, 0));

    let t = normalize("2023-06-01T12:00-03").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 6, 1, 15, 0));
  }

  #[test]
  fn basic_date_form_is_accepted() {
    let t = normalize("20230601").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 6, 1, 4, 0));
  }

  #[test]
  fn naive_time_is_reference_wall_clock() {
    let t = normalize("2023-06-01T12:00:00").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 6, 1, 16, 0));
  }

  #[test]
  fn fractional_seconds_are_kept() {
    let t = normalize("2023-06-01T12:00:00.250+00:00").unwrap();
    assert_eq!(t.timestamp_subsec_millis(), 250);
  }

  #[test]
  fn surrounding_whitespace_is_ignored() {
    let t = normalize("  2023-02-17  ").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 2, 17, 5, 0));
  }

  #[test]
  fn unreadable_time_falls_back_to_date() {
    let t = normalize("2023-02-17T around noon").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 2, 17, 5, 0));
  }

  #[test]
  fn garbage_is_rejected() {
    let err = normalize("last tuesday").unwrap_err();
    assert!(matches!(err, Error::InvalidTimestamp(s) if s == "last tuesday"));
    assert!(normalize("").is_err());
    assert!(normalize("2023-13-45").is_err());
  }

  #[test]
  fn dst_gap_uses_offset_before_transition() {
    // 02:30 on 2023-03-12 does not exist in New York.
    let t = normalize("2023-03-12T02:30:00").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 3, 12, 7, 30));
  }

  #[test]
  fn dst_overlap_picks_earliest() {
    let t = normalize("2023-11-05T01:30:00").unwrap();
    assert_eq!(t.with_timezone(&Utc), utc(2023, 11, 5, 5, 30));
  }

  #[test]
  fn canonical_rendering_is_idempotent() {
    for raw in [
      "2023-02-17",
      "2023-06-01T12:00:00Z",
      "2023-06-01 12:00:00+0530",
      "2023-06-01T12:00:00.123456-07:00",
    ] {
      let first = normalize(raw).unwrap();
      let again = normalize(&first.to_rfc3339()).unwrap();
      assert_eq!(first, again, "{raw}");
    }
  }

  #[test]
  fn epoch_is_unix_origin() {
    assert_eq!(epoch().timestamp(), 0);
  }
}
