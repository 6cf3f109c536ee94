//! Fleet overview and the store-backed analyzer.
//!
//! An overview recomputes everything from the snapshot of sessions it is
//! given: hotspots and trends run independently, recommendations consume the
//! hotspot output. No state survives between calls.

use std::time::Instant;

use log::{debug, info};
use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::geo_utils::utc_now_iso;
use crate::heatmap::{aggregate_hotspots, build_tag_routes, top_issues, Hotspot, TopIssue};
use crate::recommend::{recommend_focus_areas, Recommendation};
use crate::report::{analyze_route, RouteReport};
use crate::session::{summarize_session, Session, SessionSummary};
use crate::store::SessionStore;
use crate::trends::{compute_practice_trends, PracticeTrends};
use crate::AnalysisConfig;

/// Aggregate analysis across every stored session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetOverview {
    pub generated_at: String,
    pub routes_count: usize,
    pub heatmap: Vec<Hotspot>,
    pub top_issues: Vec<TopIssue>,
    pub practice_trends: PracticeTrends,
    pub recommended_segments: Vec<Recommendation>,
}

/// Build the fleet overview for `sessions`.
///
/// Fails with [`AnalysisError::MissingSessionId`] when any record lacks its
/// identifier. An empty slice yields an empty overview with a safety index
/// of 100.
///
/// ```rust
/// use drive_analytics::{AnalysisConfig, ReviewMarker, Session};
/// use drive_analytics::overview::build_overview;
///
/// let mut session = Session::new("session_1");
/// session.review_markers.push(ReviewMarker {
///     latitude: Some(48.137),
///     longitude: Some(11.575),
///     label: Some("School zone".into()),
///     ..Default::default()
/// });
///
/// let overview = build_overview(&[session], &AnalysisConfig::default()).unwrap();
/// assert_eq!(overview.routes_count, 1);
/// assert_eq!(overview.heatmap[0].dominant_label, "School zone");
/// assert_eq!(overview.recommended_segments[0].reason, "'School zone' has been flagged 1 times");
/// ```
pub fn build_overview(sessions: &[Session], config: &AnalysisConfig) -> Result<FleetOverview> {
    for session in sessions {
        session.validate()?;
    }

    let start = Instant::now();
    let aggregation = aggregate_hotspots(sessions, &config.heatmap);
    let tag_routes = build_tag_routes(&aggregation.hotspots, sessions);
    let issues = top_issues(&aggregation.tag_counts, &tag_routes, &config.heatmap);
    let practice_trends = compute_practice_trends(sessions, &config.motion);
    let recommended_segments = recommend_focus_areas(&aggregation.hotspots, &tag_routes, &config.recommendation);

    let mut heatmap = aggregation.hotspots;
    heatmap.truncate(config.heatmap.max_hotspots);

    info!(
        "overview: {} sessions, {} hotspots, {} recommendations in {:?}",
        sessions.len(),
        heatmap.len(),
        recommended_segments.len(),
        start.elapsed()
    );

    Ok(FleetOverview {
        generated_at: utc_now_iso(),
        routes_count: sessions.len(),
        heatmap,
        top_issues: issues,
        practice_trends,
        recommended_segments,
    })
}

/// Analytics entry point over a [`SessionStore`].
///
/// Reads only; sessions are never written back.
pub struct SessionAnalyzer<S: SessionStore> {
    store: S,
    config: AnalysisConfig,
}

impl<S: SessionStore> SessionAnalyzer<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, AnalysisConfig::default())
    }

    pub fn with_config(store: S, config: AnalysisConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Overview across every stored session.
    pub fn overview(&self) -> Result<FleetOverview> {
        let sessions = self.store.list()?;
        build_overview(&sessions, &self.config)
    }

    /// Report for one stored session.
    pub fn route_report(&self, session_id: &str) -> Result<RouteReport> {
        let session = self
            .store
            .get(session_id)?
            .ok_or_else(|| AnalysisError::SessionNotFound(session_id.to_string()))?;
        debug!("analyzer: reporting on {}", session_id);
        let report = analyze_route(&session, &self.config.motion, &self.config.report)?;
        info!(
            "analyzer: {} stability {:.1}/5, {} harsh events",
            session_id, report.stability.score, report.stability.harsh_events
        );
        Ok(report)
    }

    /// Listing rows, most recent first.
    pub fn summaries(&self) -> Result<Vec<SessionSummary>> {
        Ok(self.store.list()?.iter().map(summarize_session).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AudioNote, GpsSample, RawTags, ReviewMarker};
    use crate::store::InMemorySessionStore;
    use serde_json::json;

    fn tagged_marker(lat: f64, lng: f64, tags: &[&str]) -> ReviewMarker {
        ReviewMarker {
            latitude: Some(lat),
            longitude: Some(lng),
            tags: Some(RawTags::List(tags.iter().map(|t| json!(t)).collect())),
            ..ReviewMarker::default()
        }
    }

    fn fleet() -> Vec<Session> {
        let mut a = Session::new("a");
        a.start_time = Some("2024-05-01T10:00:00Z".into());
        a.total_duration_min = Some(30.0);
        a.review_markers = vec![tagged_marker(48.1, 11.5, &["merge"]), tagged_marker(48.1, 11.5, &["merge"])];
        a.gps_points = vec![
            GpsSample::new(48.0, 11.0, "2024-05-01T10:00:00Z", Some(20.0)),
            GpsSample::new(48.0001, 11.0, "2024-05-01T10:00:01Z", Some(5.0)),
        ];

        let mut b = Session::new("b");
        b.start_time = Some("2024-05-02T10:00:00Z".into());
        b.total_duration_min = Some(30.0);
        b.review_markers = vec![tagged_marker(48.1, 11.5, &["merge"])];
        b.audio_notes = vec![AudioNote {
            latitude: Some(47.0),
            longitude: Some(11.0),
            ..AudioNote::default()
        }];
        vec![a, b]
    }

    #[test]
    fn test_overview_end_to_end() {
        let overview = build_overview(&fleet(), &AnalysisConfig::default()).unwrap();
        assert_eq!(overview.routes_count, 2);
        assert_eq!(overview.heatmap.len(), 2);
        assert_eq!(overview.heatmap[0].count, 3);
        assert_eq!(overview.heatmap[0].routes, vec!["a", "b"]);
        assert_eq!(overview.heatmap[1].dominant_tag.as_deref(), Some("voice_note"));

        assert_eq!(overview.top_issues[0].label, "merge");
        assert_eq!(overview.top_issues[0].count, 3);
        assert_eq!(overview.top_issues[0].routes, vec!["a", "b"]);

        let summary = &overview.practice_trends.summary;
        assert_eq!(summary.total_harsh_events, 1);
        // 1 harsh event per hour, one voice note
        assert_eq!(summary.safety_index, 88.8);

        assert_eq!(overview.recommended_segments.len(), 2);
        assert_eq!(overview.recommended_segments[0].tag.as_deref(), Some("merge"));
        // The unlocated-tag raw pass has no fallback, so "voice_note" has only hotspot routes
        assert_eq!(overview.recommended_segments[1].routes, vec!["b"]);
    }

    #[test]
    fn test_overview_truncates_heatmap() {
        let mut s = Session::new("many");
        s.review_markers = (0..30).map(|i| tagged_marker(i as f64, 0.0, &["x"])).collect();
        let overview = build_overview(&[s], &AnalysisConfig::default()).unwrap();
        assert_eq!(overview.heatmap.len(), 20);
        assert_eq!(overview.recommended_segments.len(), 3);
    }

    #[test]
    fn test_empty_overview() {
        let overview = build_overview(&[], &AnalysisConfig::default()).unwrap();
        assert_eq!(overview.routes_count, 0);
        assert!(overview.heatmap.is_empty());
        assert!(overview.top_issues.is_empty());
        assert!(overview.recommended_segments.is_empty());
        assert_eq!(overview.practice_trends.summary.safety_index, 100.0);
    }

    #[test]
    fn test_overview_rejects_anonymous_session() {
        let result = build_overview(&[Session::new("ok"), Session::default()], &AnalysisConfig::default());
        assert!(matches!(result, Err(AnalysisError::MissingSessionId)));
    }

    #[test]
    fn test_analyzer_over_store() {
        let analyzer = SessionAnalyzer::new(InMemorySessionStore::with_sessions(fleet()).unwrap());
        let report = analyzer.route_report("a").unwrap();
        assert_eq!(report.route_id, "a");
        assert_eq!(report.stability.harsh_events, 1);
        assert_eq!(report.stability.score, 4.3);

        assert!(matches!(analyzer.route_report("nope"), Err(AnalysisError::SessionNotFound(_))));

        let summaries = analyzer.summaries().unwrap();
        assert_eq!(summaries[0].route_id, "b");
        assert_eq!(analyzer.overview().unwrap().routes_count, 2);
    }
}
