//! # Geographic and Time Utilities
//!
//! Fundamental operations used by every analytics component: great-circle
//! distance between recorded positions and tolerant ISO-8601 timestamp parsing.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`distance_meters`] | Great-circle distance between two coordinates |
//! | [`point_distance_meters`] | Same, for [`geo::Point`] values (x = longitude) |
//! | [`search_window_degrees`] | Degree half-widths of a box enclosing a radius |
//! | [`parse_timestamp`] | Parse an ISO-8601 string, `None` when malformed |
//! | [`utc_now_iso`] | Current UTC time rendered for report headers |
//!
//! ## Example
//!
//! ```rust
//! use drive_analytics::geo_utils;
//!
//! let d = geo_utils::distance_meters(48.0, 11.0, 48.0001, 11.0);
//! assert!((d - 11.12).abs() < 0.05);
//!
//! let a = geo_utils::parse_timestamp("2024-05-01T10:00:00Z").unwrap();
//! let b = geo_utils::parse_timestamp("2024-05-01T10:00:02.5+00:00").unwrap();
//! assert_eq!(b.seconds_since(&a), 2.5);
//! assert!(geo_utils::parse_timestamp("yesterday").is_none());
//! ```
//!
//! ## Algorithm Notes
//!
//! The haversine formula is evaluated on a sphere of radius 6,371,000 m. It is
//! total: identical points give exactly 0 and no input makes it fail.
//! `geo::Haversine` is not used because geo 0.29 fixes its radius at the mean
//! radius 6,371,008.8 m, which shifts every reported distance and speed.
//!
//! Timestamps without an offset are interpreted as UTC for ordering and are
//! rendered back without an offset, so a session recorded with naive
//! timestamps reports naive timestamps.

use std::cmp::Ordering;
use std::f64::consts::FRAC_PI_2;
use std::fmt::{self, Write as _};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use geo::Point;
use serde::{Serialize, Serializer};

/// Earth radius used by [`distance_meters`], in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance in meters between two latitude/longitude pairs.
///
/// ```rust
/// use drive_analytics::geo_utils::distance_meters;
///
/// assert_eq!(distance_meters(51.5074, -0.1278, 51.5074, -0.1278), 0.0);
/// let london_paris = distance_meters(51.5074, -0.1278, 48.8566, 2.3522);
/// assert!((london_paris - 343_500.0).abs() < 1_000.0);
/// ```
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Clamp guards asin against rounding just above 1.0 for antipodal points
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}

/// [`distance_meters`] for points stored as `geo::Point` (x = longitude, y = latitude).
#[inline]
pub fn point_distance_meters(a: Point<f64>, b: Point<f64>) -> f64 {
    distance_meters(a.y(), a.x(), b.y(), b.x())
}

/// Latitude and longitude half-widths, in degrees, of a box that holds every
/// point within `meters` (haversine) of a point at `latitude`.
///
/// The longitude half-width is `None` when the circle reaches a pole, in which
/// case the box must span every longitude.
///
/// ```rust
/// use drive_analytics::geo_utils::search_window_degrees;
///
/// let (dlat, dlon) = search_window_degrees(1_000.0, 60.0);
/// let dlon = dlon.unwrap();
/// assert!(dlon > dlat * 1.9);
/// assert!(search_window_degrees(1_000.0, 89.999).1.is_none());
/// ```
pub fn search_window_degrees(meters: f64, latitude: f64) -> (f64, Option<f64>) {
    // Slack so points exactly on the radius survive float rounding
    let angular = (meters.max(0.0) / EARTH_RADIUS_M) * (1.0 + 1e-9) + 1e-12;
    let phi = latitude.to_radians().abs();
    if angular >= FRAC_PI_2 || phi + angular >= FRAC_PI_2 {
        return (angular.to_degrees().min(180.0), None);
    }
    let dlon = (angular.sin() / phi.cos()).min(1.0).asin();
    (angular.to_degrees(), Some(dlon.to_degrees()))
}

/// Round to a fixed number of decimals (half away from zero).
#[inline]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// =============================================================================
// Timestamps
// =============================================================================

const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// A parsed point in time that remembers whether the source carried an offset.
///
/// Equality and ordering compare the instant only.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    instant: DateTime<FixedOffset>,
    has_offset: bool,
}

impl Timestamp {
    fn from_naive(naive: NaiveDateTime) -> Option<Self> {
        let utc = FixedOffset::east_opt(0)?;
        Some(Self {
            instant: utc.from_utc_datetime(&naive),
            has_offset: false,
        })
    }

    /// Whether the source string carried an explicit UTC offset.
    pub fn has_offset(&self) -> bool {
        self.has_offset
    }

    /// Signed seconds elapsed from `earlier` to `self`, microsecond precision.
    pub fn seconds_since(&self, earlier: &Timestamp) -> f64 {
        let delta = self.instant.signed_duration_since(earlier.instant);
        match delta.num_microseconds() {
            Some(us) => us as f64 / 1_000_000.0,
            None => delta.num_milliseconds() as f64 / 1_000.0,
        }
    }

    /// Render as `YYYY-MM-DDTHH:MM:SS[.ffffff][+HH:MM]`.
    ///
    /// The fraction appears only when non-zero; the offset only when the
    /// source had one.
    pub fn to_iso_string(&self) -> String {
        let mut out = self.instant.format("%Y-%m-%dT%H:%M:%S").to_string();
        let micros = (self.instant.nanosecond() % 1_000_000_000) / 1_000;
        if micros != 0 {
            let _ = write!(out, ".{:06}", micros);
        }
        if self.has_offset {
            let _ = write!(out, "{}", self.instant.format("%:z"));
        }
        out
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso_string())
    }
}

/// Parse an ISO-8601 timestamp.
///
/// A trailing `Z` is read as `+00:00`. Accepts `T` or space separators, an
/// optional fractional second, and bare dates (midnight). Returns `None` for
/// empty or malformed input; callers treat that as an invalid sample.
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = match trimmed.strip_suffix('Z').or_else(|| trimmed.strip_suffix('z')) {
        Some(rest) => format!("{rest}+00:00"),
        None => trimmed.to_string(),
    };

    for fmt in ZONED_FORMATS {
        if let Ok(instant) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(Timestamp { instant, has_offset: true });
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Timestamp::from_naive(naive);
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(Timestamp::from_naive)
}

/// Parse an optional timestamp field; absent and malformed both give `None`.
#[inline]
pub fn parse_optional_timestamp(value: Option<&str>) -> Option<Timestamp> {
    value.and_then(parse_timestamp)
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
pub fn utc_now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
