//! # Route Reports
//!
//! Single-session analysis: driving stability, speed consistency, the mix of
//! urban/rural/highway driving, the learner's most used tags, and the notable
//! moments they flagged.
//!
//! ## Scoring
//!
//! - **Stability** starts at 5.0, loses 0.7 per harsh event and never drops
//!   below 1.0. A session of 30+ minutes without harsh events earns +0.3,
//!   capped at 5.0.
//! - **Speed compliance** is the share of moving segments whose speed lies in
//!   `[0.7 × median, 1.2 × median]`. The median is the element at index
//!   `len / 2` of the sorted speeds, i.e. the upper of the two middle values
//!   for even lengths. No moving segments means 100%.
//! - **Context mix** splits segment distance into urban (< 40 km/h), rural
//!   (40 to < 70 km/h) and highway (>= 70 km/h).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geo_utils::{parse_optional_timestamp, round_to, utc_now_iso};
use crate::motion::{derive_motion, HarshEvent, MotionConfig, MotionSegment};
use crate::session::Session;
use crate::tags::{normalize_tags, FrequencyTable, TagCount};

const STABILITY_MAX: f64 = 5.0;
const STABILITY_MIN: f64 = 1.0;
const MAX_HIGHLIGHTS: usize = 3;
const MAX_TOP_TAGS: usize = 5;
const MAX_EVENTS_PER_SOURCE: usize = 5;
const MAX_NOTABLE_EVENTS: usize = 6;

const PRAISE_NOTE: &str = "No harsh braking detected in this session. Great job!";
const NO_SPEED_DATA: &str = "Insufficient speed data recorded.";
const DEFAULT_NOTE_DESCRIPTION: &str = "Audio note captured during drive.";

/// Configuration for route reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Sessions at least this long (minutes) qualify for the clean-drive bonus.
    /// Default: 30.0
    pub long_session_minutes: f64,
    /// Stability points lost per harsh event. Default: 0.7
    pub stability_penalty_per_event: f64,
    /// Bonus for a long session without harsh events. Default: 0.3
    pub long_session_bonus: f64,
    /// Lower edge of the compliance band as a fraction of the median. Default: 0.7
    pub compliance_lower_ratio: f64,
    /// Upper edge of the compliance band as a fraction of the median. Default: 1.2
    pub compliance_upper_ratio: f64,
    /// Segments slower than this are urban (km/h). Default: 40.0
    pub urban_max_kmh: f64,
    /// Segments slower than this (and not urban) are rural (km/h). Default: 70.0
    pub rural_max_kmh: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            long_session_minutes: 30.0,
            stability_penalty_per_event: 0.7,
            long_session_bonus: 0.3,
            compliance_lower_ratio: 0.7,
            compliance_upper_ratio: 1.2,
            urban_max_kmh: 40.0,
            rural_max_kmh: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration_min: f64,
    pub distance_km: f64,
    pub device_id: Option<String>,
}

/// A stability highlight: one of the hardest brakes, or praise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityReport {
    pub score: f64,
    pub out_of: u32,
    pub harsh_events: usize,
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedProfile {
    pub average_kmh: f64,
    pub max_kmh: f64,
    pub compliance_percent: f64,
    pub commentary: String,
}

/// Share of driven distance in one speed regime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextShare {
    pub label: String,
    pub share: f64,
    pub distance_km: f64,
}

/// A marker or voice note surfaced in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotableEvent {
    pub timestamp: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    /// Present on voice notes only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Complete single-route analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteReport {
    pub generated_at: String,
    pub route_id: String,
    pub summary: RouteSummary,
    pub stability: StabilityReport,
    pub speed_profile: SpeedProfile,
    pub context_mix: Vec<ContextShare>,
    pub voice_tags: Vec<TagCount>,
    pub notable_events: Vec<NotableEvent>,
}

// =============================================================================
// Stability
// =============================================================================

/// Stability score (1.0 to 5.0, unrounded) for a harsh-event count and duration.
pub fn stability_score(harsh_events: usize, duration_min: f64, config: &ReportConfig) -> f64 {
    let penalty = harsh_events as f64 * config.stability_penalty_per_event;
    let mut score = (STABILITY_MAX - penalty).max(STABILITY_MIN);
    if duration_min >= config.long_session_minutes && harsh_events == 0 {
        score = (score + config.long_session_bonus).min(STABILITY_MAX);
    }
    score
}

fn stability_highlights(events: &[HarshEvent], start_time: Option<String>) -> Vec<Highlight> {
    if events.is_empty() {
        return vec![Highlight {
            timestamp: start_time,
            kind: "praise".to_string(),
            note: PRAISE_NOTE.to_string(),
        }];
    }

    let mut worst: Vec<&HarshEvent> = events.iter().collect();
    worst.sort_by(|a, b| a.acceleration.total_cmp(&b.acceleration));
    worst
        .into_iter()
        .take(MAX_HIGHLIGHTS)
        .map(|event| Highlight {
            timestamp: Some(event.timestamp.to_iso_string()),
            kind: "brake".to_string(),
            note: format!("Hard brake detected (−{:.2} m/s²)", event.acceleration.abs()),
        })
        .collect()
}

// =============================================================================
// Speed
// =============================================================================

/// Speed compliance over positive segment speeds (km/h).
///
/// Returns `(percent, commentary)`; an empty or all-zero list is 100%.
pub fn speed_compliance(speeds_kmh: &[f64], config: &ReportConfig) -> (f64, String) {
    let mut speeds: Vec<f64> = speeds_kmh.iter().copied().filter(|s| *s > 0.0).collect();
    if speeds.is_empty() {
        return (100.0, NO_SPEED_DATA.to_string());
    }

    speeds.sort_by(|a, b| a.total_cmp(b));
    let median = speeds[speeds.len() / 2];
    let lower = median * config.compliance_lower_ratio;
    let upper = median * config.compliance_upper_ratio;

    let compliant = speeds.iter().filter(|s| lower <= **s && **s <= upper).count();
    let percent = compliant as f64 / speeds.len() as f64 * 100.0;
    let commentary = format!(
        "{:.0}% of the drive stayed within {:.0}–{:.0}% of your median speed ({:.0} km/h).",
        percent,
        config.compliance_lower_ratio * 100.0,
        config.compliance_upper_ratio * 100.0,
        median
    );
    (percent, commentary)
}

fn speed_profile(segments: &[MotionSegment], config: &ReportConfig) -> SpeedProfile {
    let (average_kmh, max_kmh) = if segments.is_empty() {
        (0.0, 0.0)
    } else {
        let sum: f64 = segments.iter().map(|s| s.speed_kmh).sum();
        let max = segments.iter().map(|s| s.speed_kmh).fold(f64::NEG_INFINITY, f64::max);
        (sum / segments.len() as f64, max)
    };

    let speeds: Vec<f64> = segments.iter().map(|s| s.speed_kmh).collect();
    let (compliance, commentary) = speed_compliance(&speeds, config);

    SpeedProfile {
        average_kmh: round_to(average_kmh, 1),
        max_kmh: round_to(max_kmh, 1),
        compliance_percent: round_to(compliance, 1),
        commentary,
    }
}

// =============================================================================
// Context mix
// =============================================================================

/// Distance share per speed regime, empty when no distance was covered.
pub fn context_mix(segments: &[MotionSegment], config: &ReportConfig) -> Vec<ContextShare> {
    let mut totals = [("urban", 0.0), ("rural", 0.0), ("highway", 0.0)];
    for segment in segments {
        let bucket = if segment.speed_kmh < config.urban_max_kmh {
            0
        } else if segment.speed_kmh < config.rural_max_kmh {
            1
        } else {
            2
        };
        totals[bucket].1 += segment.distance_km;
    }

    let total: f64 = segments.iter().map(|s| s.distance_km).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    totals
        .iter()
        .map(|(label, distance)| ContextShare {
            label: label.to_string(),
            share: distance / total,
            distance_km: *distance,
        })
        .collect()
}

// =============================================================================
// Annotations
// =============================================================================

fn voice_tags(session: &Session) -> Vec<TagCount> {
    let mut table = FrequencyTable::new();
    for note in &session.audio_notes {
        for tag in normalize_tags(note.tags.as_ref(), None) {
            table.add(&tag);
        }
    }
    for marker in &session.review_markers {
        for tag in normalize_tags(marker.tags.as_ref(), marker.kind()) {
            table.add(&tag);
        }
    }
    table.most_common(MAX_TOP_TAGS)
}

fn notable_events(session: &Session) -> Vec<NotableEvent> {
    let markers = session.review_markers.iter().take(MAX_EVENTS_PER_SOURCE).map(|marker| NotableEvent {
        timestamp: marker.timestamp.clone(),
        label: marker.label.clone(),
        description: marker.description.clone(),
        kind: marker.source_key().to_string(),
        tags: None,
    });
    let notes = session.audio_notes.iter().take(MAX_EVENTS_PER_SOURCE).map(|note| NotableEvent {
        timestamp: note.timestamp.clone(),
        label: Some("Voice note".to_string()),
        description: Some(note.transcript().unwrap_or(DEFAULT_NOTE_DESCRIPTION).to_string()),
        kind: "voice_note".to_string(),
        tags: Some(normalize_tags(note.tags.as_ref(), None)),
    });
    markers.chain(notes).take(MAX_NOTABLE_EVENTS).collect()
}

// =============================================================================
// Entry point
// =============================================================================

/// Analyse one session.
///
/// Fails only when the record has no `session_id`.
///
/// ```rust
/// use drive_analytics::{GpsSample, Session, MotionConfig, ReportConfig};
/// use drive_analytics::report::analyze_route;
///
/// let mut session = Session::new("session_1");
/// session.gps_points = vec![
///     GpsSample::new(48.0, 11.0, "2024-05-01T10:00:00Z", Some(20.0)),
///     GpsSample::new(48.0001, 11.0, "2024-05-01T10:00:01Z", Some(5.0)),
/// ];
///
/// let report = analyze_route(&session, &MotionConfig::default(), &ReportConfig::default()).unwrap();
/// assert_eq!(report.stability.harsh_events, 1);
/// assert_eq!(report.stability.score, 4.3);
/// ```
pub fn analyze_route(
    session: &Session,
    motion_config: &MotionConfig,
    config: &ReportConfig,
) -> Result<RouteReport> {
    session.validate()?;

    let start_time = parse_optional_timestamp(session.start_time.as_deref()).map(|t| t.to_iso_string());
    let end_time = parse_optional_timestamp(session.end_time.as_deref()).map(|t| t.to_iso_string());
    let duration_min = session.duration_min();

    let motion = derive_motion(&session.gps_points, motion_config);
    let harsh_count = motion.harsh_events.len();

    let stability = StabilityReport {
        score: round_to(stability_score(harsh_count, duration_min, config), 1),
        out_of: STABILITY_MAX as u32,
        harsh_events: harsh_count,
        highlights: stability_highlights(&motion.harsh_events, start_time.clone()),
    };

    Ok(RouteReport {
        generated_at: utc_now_iso(),
        route_id: session.session_id.clone(),
        summary: RouteSummary {
            start_time,
            end_time,
            duration_min,
            distance_km: session.distance_km(),
            device_id: session.device_id.clone(),
        },
        stability,
        speed_profile: speed_profile(&motion.segments, config),
        context_mix: context_mix(&motion.segments, config),
        voice_tags: voice_tags(session),
        notable_events: notable_events(session),
    })
}
