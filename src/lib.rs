//! # Drive Analytics
//!
//! Session analytics for driving-practice GPS recordings.
//!
//! This library provides:
//! - Motion derivation: time-ordered segments and harsh-braking events from
//!   noisy, unordered GPS samples
//! - Single-route reports: stability score, speed compliance, context mix,
//!   tags and notable events
//! - Fleet overviews: hotspot heatmap, top issues, practice trends and
//!   recommended focus areas
//!
//! ## Features
//!
//! - **`parallel`** - Compute per-session trend rows with rayon
//! - **`cli`** - Build the `drive-analytics` command line tool
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use drive_analytics::{AnalysisConfig, GpsSample, Session, analyze_route, build_overview};
//!
//! let mut session = Session::new("session_1");
//! session.gps_points = vec![
//!     GpsSample::new(48.0, 11.0, "2024-05-01T10:00:00Z", Some(20.0)),
//!     GpsSample::new(48.0001, 11.0, "2024-05-01T10:00:01Z", Some(5.0)),
//! ];
//!
//! let config = AnalysisConfig::default();
//! let report = analyze_route(&session, &config.motion, &config.report).unwrap();
//! println!("Stability: {}/{}", report.stability.score, report.stability.out_of);
//!
//! let overview = build_overview(&[session], &config).unwrap();
//! assert_eq!(overview.routes_count, 1);
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub mod geo_utils;
pub mod heatmap;
pub mod motion;
pub mod overview;
pub mod recommend;
pub mod report;
pub mod session;
pub mod store;
pub mod tags;
pub mod trends;

pub use error::{AnalysisError, Result};
pub use geo_utils::{distance_meters, parse_timestamp, Timestamp};
pub use heatmap::{
    aggregate_hotspots, build_tag_routes, hotspots_matching_tag, top_issues, HeatmapConfig, Hotspot,
    HotspotAggregation, HotspotIndex, TagRouteIndex, TopIssue,
};
pub use motion::{compute_segments, derive_motion, detect_harsh_events, HarshEvent, MotionConfig, MotionProfile, MotionSegment};
pub use overview::{build_overview, FleetOverview, SessionAnalyzer};
pub use recommend::{recommend_focus_areas, Recommendation, RecommendationConfig};
pub use report::{analyze_route, ReportConfig, RouteReport};
pub use session::{summarize_session, AudioNote, GpsSample, RawTags, ReviewMarker, Session, SessionSummary};
pub use store::{InMemorySessionStore, JsonDirSessionStore, SessionStore};
pub use tags::{normalize_tags, tags_loosely_match, FrequencyTable, TagCount};
pub use trends::{compute_practice_trends, PracticeTrends, TrendRow, TrendSummary};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("DriveAnalyticsRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Configuration
// ============================================================================

/// Every tunable of the analytics pipeline.
///
/// Deserialises from partial JSON; omitted fields keep their defaults.
///
/// ```
/// use drive_analytics::AnalysisConfig;
///
/// let config = AnalysisConfig::from_json(r#"{"heatmap": {"max_hotspots": 5}}"#).unwrap();
/// assert_eq!(config.heatmap.max_hotspots, 5);
/// assert_eq!(config.heatmap.top_issue_limit, 5);
/// assert_eq!(config.motion.harsh_braking_threshold, -1.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub motion: MotionConfig,
    pub report: ReportConfig,
    pub heatmap: HeatmapConfig,
    pub recommendation: RecommendationConfig,
}

impl AnalysisConfig {
    /// Parse a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::{debug, info};

    fn config_from(config_json: Option<String>) -> Result<AnalysisConfig> {
        match config_json.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(json) => AnalysisConfig::from_json(json),
            None => Ok(AnalysisConfig::default()),
        }
    }

    /// Analyse one session given as JSON; returns the report as JSON.
    #[uniffi::export]
    pub fn analyze_route_json(session_json: String, config_json: Option<String>) -> Result<String> {
        init_logging();
        let config = config_from(config_json)?;
        let session: Session = serde_json::from_str(&session_json)?;
        debug!("[DriveAnalyticsRust] analyze_route_json for {}", session.session_id);
        let report = analyze_route(&session, &config.motion, &config.report)?;
        Ok(serde_json::to_string(&report)?)
    }

    /// Build the fleet overview from a JSON array of sessions.
    #[uniffi::export]
    pub fn build_overview_json(sessions_json: String, config_json: Option<String>) -> Result<String> {
        init_logging();
        let config = config_from(config_json)?;
        let sessions: Vec<Session> = serde_json::from_str(&sessions_json)?;
        info!("[DriveAnalyticsRust] build_overview_json with {} sessions", sessions.len());

        let start = std::time::Instant::now();
        let overview = build_overview(&sessions, &config)?;
        info!("[DriveAnalyticsRust] overview built in {:?}", start.elapsed());
        Ok(serde_json::to_string(&overview)?)
    }

    /// Listing row for one session given as JSON.
    #[uniffi::export]
    pub fn summarize_session_json(session_json: String) -> Result<String> {
        init_logging();
        let session: Session = serde_json::from_str(&session_json)?;
        Ok(serde_json::to_string(&summarize_session(&session))?)
    }

    /// Default configuration as JSON, for clients that edit and send it back.
    #[uniffi::export]
    pub fn default_analysis_config_json() -> String {
        init_logging();
        serde_json::to_string(&AnalysisConfig::default()).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.motion.harsh_braking_threshold, -1.5);
        assert_eq!(config.report.long_session_minutes, 30.0);
        assert_eq!(config.report.compliance_upper_ratio, 1.2);
        assert_eq!(config.heatmap.grid_scale, 1000.0);
        assert_eq!(config.heatmap.max_hotspots, 20);
        assert_eq!(config.recommendation.max_recommendations, 3);
    }

    #[test]
    fn test_partial_config_json() {
        let config = AnalysisConfig::from_json(
            r#"{"motion": {"harsh_braking_threshold": -2.5}, "report": {"urban_max_kmh": 30}}"#,
        )
        .unwrap();
        assert_eq!(config.motion.harsh_braking_threshold, -2.5);
        assert_eq!(config.report.urban_max_kmh, 30.0);
        assert_eq!(config.report.rural_max_kmh, 70.0);
        assert_eq!(config.recommendation, RecommendationConfig::default());

        assert!(AnalysisConfig::from_json("{}").is_ok());
        assert!(matches!(AnalysisConfig::from_json("[1"), Err(AnalysisError::Json(_))));
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = AnalysisConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(AnalysisConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_custom_threshold_flows_through_report() {
        let mut session = Session::new("gentle");
        session.gps_points = vec![
            GpsSample::new(48.0, 11.0, "2024-05-01T10:00:00Z", Some(10.0)),
            GpsSample::new(48.0001, 11.0, "2024-05-01T10:00:01Z", Some(8.0)),
        ];
        let mut config = AnalysisConfig::default();
        let report = analyze_route(&session, &config.motion, &config.report).unwrap();
        assert_eq!(report.stability.harsh_events, 1);

        config.motion.harsh_braking_threshold = -3.0;
        let report = analyze_route(&session, &config.motion, &config.report).unwrap();
        assert_eq!(report.stability.harsh_events, 0);
    }
}
