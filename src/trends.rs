//! Practice trends: one row per session plus fleet-wide totals.
//!
//! The fleet safety index rewards voice-note engagement and penalises the
//! harsh-braking rate per driven hour:
//!
//! ```text
//! harsh_per_hour = total_harsh / (total_minutes / 60)   (total_harsh when no minutes)
//! safety_index   = clamp(100 - 12 * harsh_per_hour + 0.8 * voice_notes, 0, 100)
//! ```

use log::debug;
use serde::Serialize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::geo_utils::{parse_optional_timestamp, round_to};
use crate::motion::{detect_harsh_events, MotionConfig};
use crate::session::Session;

/// One session in the trend table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    pub route_id: String,
    pub recorded_at: Option<String>,
    pub duration_min: f64,
    pub distance_km: f64,
    pub voice_notes: usize,
    pub markers: usize,
    pub harsh_events: usize,
    pub safety_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub session_count: usize,
    pub total_duration_min: f64,
    pub total_distance_km: f64,
    pub average_duration_min: f64,
    pub average_distance_km: f64,
    pub total_harsh_events: usize,
    pub safety_index: f64,
    pub voice_notes_logged: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeTrends {
    pub sessions: Vec<TrendRow>,
    pub summary: TrendSummary,
}

/// Per-session score: `clamp(100 - 8 * harsh + 1.5 * markers, 0, 100)`.
pub fn session_safety_score(harsh_events: usize, markers: usize) -> f64 {
    (100.0 - harsh_events as f64 * 8.0 + markers as f64 * 1.5).clamp(0.0, 100.0)
}

/// Fleet safety index, 100 for an empty fleet.
pub fn fleet_safety_index(total_harsh: usize, total_duration_min: f64, total_voice_notes: usize) -> f64 {
    let harsh_per_hour = if total_duration_min > 0.0 {
        total_harsh as f64 / (total_duration_min / 60.0)
    } else {
        total_harsh as f64
    };
    (100.0 - harsh_per_hour * 12.0 + total_voice_notes as f64 * 0.8).clamp(0.0, 100.0)
}

fn trend_row(session: &Session, motion_config: &MotionConfig) -> TrendRow {
    let harsh_events = detect_harsh_events(&session.gps_points, motion_config.harsh_braking_threshold).len();
    let markers = session.review_markers.len();
    TrendRow {
        route_id: session.session_id.clone(),
        recorded_at: parse_optional_timestamp(session.start_time.as_deref()).map(|t| t.to_iso_string()),
        duration_min: session.duration_min(),
        distance_km: session.distance_km(),
        voice_notes: session.audio_notes.len(),
        markers,
        harsh_events,
        safety_score: round_to(session_safety_score(harsh_events, markers), 1),
    }
}

/// Build trend rows and the fleet summary.
///
/// Rows are ordered by their rendered `recorded_at`; sessions without a
/// parseable start time sort first. With the `parallel` feature the rows are
/// computed on the rayon pool; the result is identical.
///
/// ```rust
/// use drive_analytics::MotionConfig;
/// use drive_analytics::trends::compute_practice_trends;
///
/// let trends = compute_practice_trends(&[], &MotionConfig::default());
/// assert_eq!(trends.summary.session_count, 0);
/// assert_eq!(trends.summary.safety_index, 100.0);
/// ```
pub fn compute_practice_trends(sessions: &[Session], motion_config: &MotionConfig) -> PracticeTrends {
    #[cfg(feature = "parallel")]
    let mut rows: Vec<TrendRow> = sessions.par_iter().map(|s| trend_row(s, motion_config)).collect();

    #[cfg(not(feature = "parallel"))]
    let mut rows: Vec<TrendRow> = sessions.iter().map(|s| trend_row(s, motion_config)).collect();

    let total_duration: f64 = rows.iter().map(|r| r.duration_min).sum();
    let total_distance: f64 = rows.iter().map(|r| r.distance_km).sum();
    let total_harsh: usize = rows.iter().map(|r| r.harsh_events).sum();
    let total_notes: usize = rows.iter().map(|r| r.voice_notes).sum();

    rows.sort_by(|a, b| {
        let ka = a.recorded_at.as_deref().unwrap_or("");
        let kb = b.recorded_at.as_deref().unwrap_or("");
        ka.cmp(kb)
    });

    let count = rows.len();
    let (avg_duration, avg_distance) = if count > 0 {
        (total_duration / count as f64, total_distance / count as f64)
    } else {
        (0.0, 0.0)
    };
    let safety_index = fleet_safety_index(total_harsh, total_duration, total_notes);
    debug!(
        "trends: {} sessions, {:.1} min, {} harsh events, safety index {:.1}",
        count, total_duration, total_harsh, safety_index
    );

    PracticeTrends {
        sessions: rows,
        summary: TrendSummary {
            session_count: count,
            total_duration_min: round_to(total_duration, 2),
            total_distance_km: round_to(total_distance, 2),
            average_duration_min: round_to(avg_duration, 2),
            average_distance_km: round_to(avg_distance, 2),
            total_harsh_events: total_harsh,
            safety_index: round_to(safety_index, 1),
            voice_notes_logged: total_notes,
        },
    }
}
