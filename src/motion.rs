//! # Motion Derivation
//!
//! Turns the raw, possibly unordered GPS stream of a session into
//! time-ordered motion segments and harsh-braking events.
//!
//! ## Algorithm
//! 1. Drop samples without latitude, longitude or a parseable timestamp
//! 2. Fewer than two valid samples: no segments, no events
//! 3. Stable-sort the rest by timestamp
//! 4. Walk consecutive pairs once. A pair with a non-positive time delta is
//!    skipped, but the later sample still becomes the new "previous" sample
//! 5. Segment speed is the reported speed of the later sample, else
//!    distance / time
//! 6. Acceleration is measured against the speed carried from the previous
//!    iteration; below the braking threshold the pair yields a [`HarshEvent`]

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo_utils::{distance_meters, parse_optional_timestamp, Timestamp};
use crate::session::GpsSample;

/// Configuration for motion derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Deceleration below this value (m/s², negative) is a harsh-braking event.
    /// Default: -1.5
    pub harsh_braking_threshold: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self { harsh_braking_threshold: -1.5 }
    }
}

/// Interval between two consecutive valid samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionSegment {
    pub start: Timestamp,
    pub end: Timestamp,
    /// Always > 0
    pub duration_s: f64,
    pub distance_km: f64,
    pub speed_ms: f64,
    pub speed_kmh: f64,
}

/// A hard-braking instant, located at the later sample of its pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarshEvent {
    pub timestamp: Timestamp,
    /// Signed acceleration in m/s² (negative)
    pub acceleration: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Segments and harsh events of one session, both in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MotionProfile {
    pub segments: Vec<MotionSegment>,
    pub harsh_events: Vec<HarshEvent>,
}

#[derive(Debug, Clone, Copy)]
struct TimedSample {
    latitude: f64,
    longitude: f64,
    timestamp: Timestamp,
    speed: Option<f64>,
}

impl TimedSample {
    fn distance_to(&self, other: &TimedSample) -> f64 {
        distance_meters(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Valid samples in ascending time order (stable for equal stamps).
fn valid_samples(points: &[GpsSample]) -> Vec<TimedSample> {
    let mut samples: Vec<TimedSample> = points
        .iter()
        .filter_map(|p| {
            Some(TimedSample {
                latitude: p.latitude?,
                longitude: p.longitude?,
                timestamp: parse_optional_timestamp(p.timestamp.as_deref())?,
                speed: p.speed,
            })
        })
        .collect();
    samples.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    samples
}

/// Derive motion segments from raw samples.
///
/// Returns at most `valid_samples - 1` segments, strictly ordered by start.
pub fn compute_segments(points: &[GpsSample]) -> Vec<MotionSegment> {
    segments_from(&valid_samples(points))
}

fn segments_from(samples: &[TimedSample]) -> Vec<MotionSegment> {
    let mut segments = Vec::new();
    let Some((first, rest)) = samples.split_first() else {
        return segments;
    };

    let mut prev = first;
    for current in rest {
        let delta_t = current.timestamp.seconds_since(&prev.timestamp);
        if delta_t <= 0.0 {
            prev = current;
            continue;
        }

        let distance_m = prev.distance_to(current);
        let speed_ms = current.speed.unwrap_or(distance_m / delta_t);
        segments.push(MotionSegment {
            start: prev.timestamp,
            end: current.timestamp,
            duration_s: delta_t,
            distance_km: distance_m / 1000.0,
            speed_ms,
            speed_kmh: speed_ms * 3.6,
        });
        prev = current;
    }

    segments
}

/// Detect harsh-braking events in raw samples.
///
/// ```rust
/// use drive_analytics::GpsSample;
/// use drive_analytics::motion::detect_harsh_events;
///
/// let points = vec![
///     GpsSample::new(48.0001, 11.0, "2024-05-01T10:00:01Z", Some(5.0)),
///     GpsSample::new(48.0, 11.0, "2024-05-01T10:00:00Z", Some(20.0)),
/// ];
/// let events = detect_harsh_events(&points, -1.5);
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].acceleration, -15.0);
/// ```
pub fn detect_harsh_events(points: &[GpsSample], threshold: f64) -> Vec<HarshEvent> {
    harsh_events_from(&valid_samples(points), threshold)
}

fn harsh_events_from(samples: &[TimedSample], threshold: f64) -> Vec<HarshEvent> {
    let mut events = Vec::new();
    let Some((first, rest)) = samples.split_first() else {
        return events;
    };

    let mut prev = first;
    let mut prev_speed = first.speed;

    for current in rest {
        let delta_t = current.timestamp.seconds_since(&prev.timestamp);
        if delta_t <= 0.0 {
            prev = current;
            prev_speed = current.speed;
            continue;
        }

        // Either side unreported: fall back to positional speed
        let speed = match (current.speed, prev_speed) {
            (Some(reported), Some(_)) => reported,
            _ => prev.distance_to(current) / delta_t,
        };
        let acceleration = (speed - prev_speed.unwrap_or(0.0)) / delta_t;

        if acceleration < threshold {
            events.push(HarshEvent {
                timestamp: current.timestamp,
                acceleration,
                latitude: current.latitude,
                longitude: current.longitude,
            });
        }

        prev = current;
        prev_speed = Some(speed);
    }

    events
}

/// Derive segments and harsh events in one pass over the sorted samples.
pub fn derive_motion(points: &[GpsSample], config: &MotionConfig) -> MotionProfile {
    let samples = valid_samples(points);
    if samples.len() < 2 {
        debug!("motion: {} valid of {} samples, nothing to derive", samples.len(), points.len());
        return MotionProfile::default();
    }

    let profile = MotionProfile {
        segments: segments_from(&samples),
        harsh_events: harsh_events_from(&samples, config.harsh_braking_threshold),
    };
    debug!(
        "motion: {} samples -> {} segments, {} harsh events",
        samples.len(),
        profile.segments.len(),
        profile.harsh_events.len()
    );
    profile
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn at(second: u32) -> String {
        format!("2024-05-01T10:{:02}:{:02}Z", second / 60, second % 60)
    }

    fn sample(second: u32, lat: f64, speed: Option<f64>) -> GpsSample {
        GpsSample::new(lat, 11.0, &at(second), speed)
    }

    #[test]
    fn test_two_sample_braking_scenario() {
        let points = vec![sample(0, 48.0, Some(20.0)), sample(1, 48.0001, Some(5.0))];
        let profile = derive_motion(&points, &MotionConfig::default());

        assert_eq!(profile.segments.len(), 1);
        let seg = &profile.segments[0];
        assert!(approx_eq(seg.distance_km * 1000.0, 11.12, 0.01));
        // Reported speed wins over positional speed
        assert_eq!(seg.speed_ms, 5.0);
        assert!(approx_eq(seg.speed_kmh, 18.0, 1e-9));
        assert_eq!(seg.duration_s, 1.0);

        assert_eq!(profile.harsh_events.len(), 1);
        let event = &profile.harsh_events[0];
        assert_eq!(event.acceleration, -15.0);
        assert_eq!(event.latitude, 48.0001);
        assert_eq!(event.timestamp.to_iso_string(), "2024-05-01T10:00:01+00:00");
    }

    #[test]
    fn test_fewer_than_two_valid_samples() {
        let config = MotionConfig::default();
        assert_eq!(derive_motion(&[], &config), MotionProfile::default());
        assert_eq!(derive_motion(&[sample(0, 48.0, Some(3.0))], &config), MotionProfile::default());

        let mut broken = sample(5, 48.1, None);
        broken.timestamp = Some("garbage".into());
        let mut no_lat = sample(6, 48.1, None);
        no_lat.latitude = None;
        let profile = derive_motion(&[sample(0, 48.0, None), broken, no_lat], &config);
        assert!(profile.segments.is_empty());
        assert!(profile.harsh_events.is_empty());
    }

    #[test]
    fn test_unordered_input_is_sorted() {
        let points = vec![
            sample(20, 48.0020, None),
            sample(0, 48.0000, None),
            sample(10, 48.0010, None),
        ];
        let segments = compute_segments(&points);
        assert_eq!(segments.len(), 2);
        assert!(segments[0].start < segments[0].end);
        assert!(segments[0].end <= segments[1].start);
        assert_eq!(segments[0].duration_s, 10.0);
    }

    #[test]
    fn test_duplicate_timestamps_are_skipped() {
        let points = vec![
            sample(0, 48.0000, None),
            sample(0, 48.0005, None),
            sample(0, 48.0010, None),
        ];
        let profile = derive_motion(&points, &MotionConfig::default());
        assert!(profile.segments.is_empty());
        assert!(profile.harsh_events.is_empty());
    }

    #[test]
    fn test_skipped_pair_advances_previous_sample() {
        // Second sample duplicates the first stamp; the third pair must be
        // measured from the second sample's position.
        let points = vec![
            sample(0, 48.0000, None),
            sample(0, 48.0010, None),
            sample(10, 48.0011, None),
        ];
        let segments = compute_segments(&points);
        assert_eq!(segments.len(), 1);
        let expected_km = distance_meters(48.0010, 11.0, 48.0011, 11.0) / 1000.0;
        assert!(approx_eq(segments[0].distance_km, expected_km, 1e-12));
    }

    #[test]
    fn test_duplicate_stamp_resets_baseline_speed() {
        // 20 and 30 m/s share a stamp; the drop to 5 is measured from 30
        let points = vec![
            sample(0, 48.0000, Some(20.0)),
            sample(0, 48.0002, Some(30.0)),
            sample(1, 48.0004, Some(5.0)),
        ];
        let events = detect_harsh_events(&points, -1.5);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].acceleration, -25.0);
        assert_eq!(derive_motion(&points, &MotionConfig::default()).harsh_events, events);
    }

    #[test]
    fn test_duplicate_stamp_without_speed_clears_baseline() {
        // The speedless duplicate replaces the 20 m/s baseline, so the next
        // pair uses positional speed (~22 m/s) against zero: no braking.
        let points = vec![
            sample(0, 48.0000, Some(20.0)),
            sample(0, 48.0002, None),
            sample(1, 48.0004, Some(5.0)),
        ];
        assert!(detect_harsh_events(&points, -1.5).is_empty());

        // Control: without the duplicate, 20 -> 5 is harsh
        let control = vec![sample(0, 48.0000, Some(20.0)), sample(1, 48.0004, Some(5.0))];
        assert_eq!(detect_harsh_events(&control, -1.5)[0].acceleration, -15.0);
    }

    #[test]
    fn test_segment_count_bound_and_order() {
        let points: Vec<GpsSample> = (0..30)
            .rev()
            .map(|i| sample(i * 2, 48.0 + i as f64 * 0.0002, Some(10.0)))
            .collect();
        let segments = compute_segments(&points);
        assert_eq!(segments.len(), 29);
        for pair in segments.windows(2) {
            assert!(pair[0].start < pair[1].start);
        }
    }

    #[test]
    fn test_derived_speed_when_missing() {
        let points = vec![sample(0, 48.0, None), sample(2, 48.0002, None)];
        let seg = &compute_segments(&points)[0];
        let expected = distance_meters(48.0, 11.0, 48.0002, 11.0) / 2.0;
        assert!(approx_eq(seg.speed_ms, expected, 1e-9));
    }

    #[test]
    fn test_missing_previous_speed_uses_positional_speed() {
        // prev has no speed, current reports 0: positional speed (~11 m/s)
        // against a zero baseline is acceleration, not braking.
        let points = vec![sample(0, 48.0, None), sample(1, 48.0001, Some(0.0))];
        assert!(detect_harsh_events(&points, -1.5).is_empty());
    }

    #[test]
    fn test_speed_carried_across_iterations() {
        // 20 -> 19 -> 5 m/s at 1 s steps: only the second drop is harsh
        let points = vec![
            sample(0, 48.0000, Some(20.0)),
            sample(1, 48.0002, Some(19.0)),
            sample(2, 48.0004, Some(5.0)),
        ];
        let events = detect_harsh_events(&points, -1.5);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].acceleration, -14.0);
    }

    #[test]
    fn test_custom_threshold() {
        let points = vec![sample(0, 48.0, Some(10.0)), sample(1, 48.0001, Some(9.0))];
        assert!(detect_harsh_events(&points, -1.5).is_empty());
        assert_eq!(detect_harsh_events(&points, -0.5).len(), 1);
    }
}
