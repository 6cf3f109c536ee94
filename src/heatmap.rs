//! Hotspot heatmap across sessions.
//!
//! Review markers and voice notes are bucketed into a sparse grid keyed by
//! coordinates scaled by [`HeatmapConfig::grid_scale`] and rounded (0.001°
//! cells by default). Each cell tracks:
//! - Event count and coordinate sum (centroid is the mean of raw positions)
//! - Label, tag and source histograms (insertion ordered)
//! - Sessions contributing to the cell
//!
//! Alongside the grid this module builds the fleet-wide tag→routes index,
//! the top-issue list, and an R-tree over hotspot centroids for
//! "what is near me" lookups.

use std::collections::HashMap;

use geo::Point;
use log::debug;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

use crate::geo_utils::{point_distance_meters, search_window_degrees};
use crate::session::Session;
use crate::tags::{normalize_tags, tags_loosely_match, FrequencyTable, TagCount};

const VOICE_NOTE_LABEL: &str = "Voice note";
const VOICE_NOTE_SOURCE: &str = "voice_note";
const DEFAULT_HOTSPOT_LABEL: &str = "Hotspot";

/// Configuration for hotspot aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Coordinates are multiplied by this before rounding to a cell key (default: 1000)
    pub grid_scale: f64,
    /// Hotspots kept in the overview heatmap (default: 20)
    pub max_hotspots: usize,
    /// Tags listed per hotspot (default: 5)
    pub max_tags_per_hotspot: usize,
    /// Entries in the top-issue list (default: 5)
    pub top_issue_limit: usize,
    /// Routes listed per top issue (default: 5)
    pub top_issue_route_limit: usize,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            grid_scale: 1000.0,
            max_hotspots: 20,
            max_tags_per_hotspot: 5,
            top_issue_limit: 5,
            top_issue_route_limit: 5,
        }
    }
}

/// A populated grid cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hotspot {
    /// `"{lat_key}_{lon_key}"`
    pub cluster_id: String,
    pub count: u32,
    /// Centroid of contributing events
    pub latitude: f64,
    pub longitude: f64,
    pub dominant_label: String,
    pub dominant_tag: Option<String>,
    pub tags: Vec<TagCount>,
    /// Contributing session ids in first-seen order
    pub routes: Vec<String>,
    pub source_breakdown: FrequencyTable,
}

/// Result of [`aggregate_hotspots`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotspotAggregation {
    /// All hotspots by descending count, ties in cell creation order
    pub hotspots: Vec<Hotspot>,
    /// Every tag counted while clustering
    pub tag_counts: FrequencyTable,
}

/// A frequent tag with the routes it appears on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopIssue {
    pub label: String,
    pub count: u32,
    pub routes: Vec<String>,
}

// Internal cell data during construction
#[derive(Debug)]
struct CellBuilder {
    count: u32,
    coord_sum: Point<f64>, // x = lng, y = lat
    labels: FrequencyTable,
    tags: FrequencyTable,
    routes: Vec<String>,
    sources: FrequencyTable,
}

impl CellBuilder {
    fn new() -> Self {
        Self {
            count: 0,
            coord_sum: Point::new(0.0, 0.0),
            labels: FrequencyTable::new(),
            tags: FrequencyTable::new(),
            routes: Vec::new(),
            sources: FrequencyTable::new(),
        }
    }
}

/// Grid coordinate
type CellCoord = (i64, i64);

/// One annotation placed on the grid
struct GridEvent<'a> {
    latitude: f64,
    longitude: f64,
    label: &'a str,
    tags: Vec<String>,
    source: &'a str,
}

/// Hotspot grid builder
struct HotspotGrid {
    scale: f64,
    index: HashMap<CellCoord, usize>,
    cells: Vec<(CellCoord, CellBuilder)>,
    tag_counts: FrequencyTable,
}

impl HotspotGrid {
    fn new(scale: f64) -> Self {
        Self {
            scale,
            index: HashMap::new(),
            cells: Vec::new(),
            tag_counts: FrequencyTable::new(),
        }
    }

    /// Convert lat/lng to grid coordinates (round half to even)
    fn to_grid_coords(&self, lat: f64, lng: f64) -> CellCoord {
        (
            (lat * self.scale).round_ties_even() as i64,
            (lng * self.scale).round_ties_even() as i64,
        )
    }

    fn add_event(&mut self, route_id: &str, event: GridEvent<'_>) {
        let coord = self.to_grid_coords(event.latitude, event.longitude);
        let slot = match self.index.get(&coord) {
            Some(&slot) => slot,
            None => {
                self.index.insert(coord, self.cells.len());
                self.cells.push((coord, CellBuilder::new()));
                self.cells.len() - 1
            }
        };
        let cell = &mut self.cells[slot].1;

        cell.count += 1;
        cell.coord_sum = cell.coord_sum + Point::new(event.longitude, event.latitude);
        cell.labels.add(event.label);
        for tag in &event.tags {
            cell.tags.add(tag);
            self.tag_counts.add(tag);
        }
        if !cell.routes.iter().any(|r| r == route_id) {
            cell.routes.push(route_id.to_string());
        }
        cell.sources.add(event.source);
    }

    /// Build the final aggregation
    fn build(self, max_tags: usize) -> HotspotAggregation {
        let mut hotspots: Vec<Hotspot> = self
            .cells
            .into_iter()
            .filter(|(_, cell)| cell.count > 0)
            .map(|((lat_key, lng_key), cell)| {
                let centroid = cell.coord_sum / cell.count as f64;
                Hotspot {
                    cluster_id: format!("{}_{}", lat_key, lng_key),
                    count: cell.count,
                    latitude: centroid.y(),
                    longitude: centroid.x(),
                    dominant_label: cell.labels.mode().unwrap_or(DEFAULT_HOTSPOT_LABEL).to_string(),
                    dominant_tag: cell.tags.mode().map(str::to_string),
                    tags: cell.tags.most_common(max_tags),
                    routes: cell.routes,
                    source_breakdown: cell.sources,
                }
            })
            .collect();

        // Stable: equal counts keep cell creation order
        hotspots.sort_by(|a, b| b.count.cmp(&a.count));

        HotspotAggregation { hotspots, tag_counts: self.tag_counts }
    }
}

/// Cluster every located marker and voice note across `sessions`.
///
/// Markers contribute their label (or type, or `"Key location"`), their tags
/// falling back to the marker type, and their type as source. Voice notes
/// contribute `"Voice note"`, tags falling back to `"voice_note"`, and source
/// `"voice_note"`. Annotations without coordinates are skipped.
///
/// ```rust
/// use drive_analytics::{HeatmapConfig, ReviewMarker, Session};
/// use drive_analytics::heatmap::aggregate_hotspots;
///
/// let mut a = Session::new("a");
/// a.review_markers.push(ReviewMarker { latitude: Some(48.1371), longitude: Some(11.5753), ..Default::default() });
/// let mut b = Session::new("b");
/// b.review_markers.push(ReviewMarker { latitude: Some(48.1373), longitude: Some(11.5754), ..Default::default() });
///
/// let result = aggregate_hotspots(&[a, b], &HeatmapConfig::default());
/// assert_eq!(result.hotspots.len(), 1);
/// assert_eq!(result.hotspots[0].count, 2);
/// assert!((result.hotspots[0].latitude - 48.1372).abs() < 1e-9);
/// ```
pub fn aggregate_hotspots(sessions: &[Session], config: &HeatmapConfig) -> HotspotAggregation {
    let mut grid = HotspotGrid::new(config.grid_scale);

    for session in sessions {
        for marker in &session.review_markers {
            let (Some(latitude), Some(longitude)) = (marker.latitude, marker.longitude) else {
                continue;
            };
            grid.add_event(
                &session.session_id,
                GridEvent {
                    latitude,
                    longitude,
                    label: marker.display_label(),
                    tags: normalize_tags(marker.tags.as_ref(), marker.kind()),
                    source: marker.source_key(),
                },
            );
        }

        for note in &session.audio_notes {
            let (Some(latitude), Some(longitude)) = (note.latitude, note.longitude) else {
                continue;
            };
            grid.add_event(
                &session.session_id,
                GridEvent {
                    latitude,
                    longitude,
                    label: VOICE_NOTE_LABEL,
                    tags: normalize_tags(note.tags.as_ref(), Some(VOICE_NOTE_SOURCE)),
                    source: VOICE_NOTE_SOURCE,
                },
            );
        }
    }

    let result = grid.build(config.max_tags_per_hotspot);
    debug!(
        "heatmap: {} sessions -> {} hotspots, {} distinct tags",
        sessions.len(),
        result.hotspots.len(),
        result.tag_counts.len()
    );
    result
}

// =============================================================================
// Tag → routes index
// =============================================================================

/// Tag to contributing session ids, both in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRouteIndex {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl TagRouteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `route_id` to `tag`; duplicates are ignored.
    pub fn insert(&mut self, tag: &str, route_id: &str) {
        let slot = match self.index.get(tag) {
            Some(&slot) => slot,
            None => {
                self.index.insert(tag.to_string(), self.entries.len());
                self.entries.push((tag.to_string(), Vec::new()));
                self.entries.len() - 1
            }
        };
        let routes = &mut self.entries[slot].1;
        if !routes.iter().any(|r| r == route_id) {
            routes.push(route_id.to_string());
        }
    }

    /// Routes linked to `tag`, empty when unknown.
    pub fn routes(&self, tag: &str) -> &[String] {
        match self.index.get(tag) {
            Some(&slot) => &self.entries[slot].1,
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(tag, routes)| (tag.as_str(), routes.as_slice()))
    }
}

/// Build the tag→routes index.
///
/// First every listed tag of every hotspot receives that hotspot's routes.
/// Then a pass over the raw sessions links each tagged note (no fallback)
/// and marker (falling back to its type) to its session, so tags that never
/// surfaced on a hotspot still resolve to routes.
pub fn build_tag_routes(hotspots: &[Hotspot], sessions: &[Session]) -> TagRouteIndex {
    let mut index = TagRouteIndex::new();

    for hotspot in hotspots {
        for tag in &hotspot.tags {
            for route in &hotspot.routes {
                index.insert(&tag.label, route);
            }
        }
    }

    for session in sessions {
        for note in &session.audio_notes {
            for tag in normalize_tags(note.tags.as_ref(), None) {
                index.insert(&tag, &session.session_id);
            }
        }
        for marker in &session.review_markers {
            for tag in normalize_tags(marker.tags.as_ref(), marker.kind()) {
                index.insert(&tag, &session.session_id);
            }
        }
    }

    index
}

/// The most frequent tags with up to `top_issue_route_limit` routes each.
pub fn top_issues(tag_counts: &FrequencyTable, tag_routes: &TagRouteIndex, config: &HeatmapConfig) -> Vec<TopIssue> {
    tag_counts
        .most_common(config.top_issue_limit)
        .into_iter()
        .map(|TagCount { label, count }| {
            let routes = tag_routes
                .routes(&label)
                .iter()
                .take(config.top_issue_route_limit)
                .cloned()
                .collect();
            TopIssue { label, count, routes }
        })
        .collect()
}

/// Hotspots whose dominant tag loosely matches `tag` (see [`tags_loosely_match`]).
pub fn hotspots_matching_tag<'a>(hotspots: &'a [Hotspot], tag: &str) -> Vec<&'a Hotspot> {
    let wanted = tag.trim().to_lowercase();
    hotspots
        .iter()
        .filter(|h| h.dominant_tag.as_deref().is_some_and(|t| tags_loosely_match(t, &wanted)))
        .collect()
}

// =============================================================================
// Spatial lookup
// =============================================================================

/// A hotspot centroid with its position in the source slice
#[derive(Debug, Clone, Copy)]
struct IndexedHotspot {
    idx: usize,
    lat: f64,
    lng: f64,
}

impl RTreeObject for IndexedHotspot {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lng])
    }
}

impl PointDistance for IndexedHotspot {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.lat - point[0];
        let dlng = self.lng - point[1];
        dlat * dlat + dlng * dlng
    }
}

/// R-tree over hotspot centroids.
///
/// Candidates come from a degree-space bounding box that encloses the search
/// circle; the final choice is made on haversine distance.
pub struct HotspotIndex<'a> {
    hotspots: &'a [Hotspot],
    tree: RTree<IndexedHotspot>,
}

impl<'a> HotspotIndex<'a> {
    pub fn new(hotspots: &'a [Hotspot]) -> Self {
        let indexed: Vec<IndexedHotspot> = hotspots
            .iter()
            .enumerate()
            .map(|(idx, h)| IndexedHotspot { idx, lat: h.latitude, lng: h.longitude })
            .collect();
        Self { hotspots, tree: RTree::bulk_load(indexed) }
    }

    /// Closest hotspot within `radius_m` meters, with its distance.
    pub fn nearest(&self, latitude: f64, longitude: f64, radius_m: f64) -> Option<(&'a Hotspot, f64)> {
        self.within(latitude, longitude, radius_m).into_iter().next()
    }

    /// All hotspots within `radius_m` meters, closest first.
    pub fn within(&self, latitude: f64, longitude: f64, radius_m: f64) -> Vec<(&'a Hotspot, f64)> {
        if radius_m < 0.0 || !radius_m.is_finite() {
            return Vec::new();
        }
        let (dlat, dlon) = search_window_degrees(radius_m, latitude);
        // Boxes crossing the antimeridian or a pole fall back to every longitude
        let (lng_min, lng_max) = match dlon {
            Some(d) if longitude - d >= -180.0 && longitude + d <= 180.0 => (longitude - d, longitude + d),
            _ => (f64::NEG_INFINITY, f64::INFINITY),
        };
        let window = AABB::from_corners([latitude - dlat, lng_min], [latitude + dlat, lng_max]);
        let origin = Point::new(longitude, latitude);

        let mut found: Vec<(&'a Hotspot, f64)> = self
            .tree
            .locate_in_envelope(&window)
            .filter_map(|candidate| {
                let hotspot = &self.hotspots[candidate.idx];
                let dist = point_distance_meters(origin, Point::new(candidate.lng, candidate.lat));
                (dist <= radius_m).then_some((hotspot, dist))
            })
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        found
    }

    pub fn len(&self) -> usize {
        self.hotspots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::distance_meters;
    use crate::session::{AudioNote, RawTags, ReviewMarker};
    use serde_json::json;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn marker(lat: f64, lng: f64, kind: Option<&str>, tags: &[&str]) -> ReviewMarker {
        ReviewMarker {
            latitude: Some(lat),
            longitude: Some(lng),
            kind: kind.map(str::to_string),
            tags: if tags.is_empty() {
                None
            } else {
                Some(RawTags::List(tags.iter().map(|t| json!(t)).collect()))
            },
            ..ReviewMarker::default()
        }
    }

    fn note(lat: f64, lng: f64, tags: &[&str]) -> AudioNote {
        AudioNote {
            latitude: Some(lat),
            longitude: Some(lng),
            tags: if tags.is_empty() {
                None
            } else {
                Some(RawTags::List(tags.iter().map(|t| json!(t)).collect()))
            },
            ..AudioNote::default()
        }
    }

    fn session(id: &str, markers: Vec<ReviewMarker>, notes: Vec<AudioNote>) -> Session {
        let mut s = Session::new(id);
        s.review_markers = markers;
        s.audio_notes = notes;
        s
    }

    #[test]
    fn test_centroid_is_mean_of_raw_coordinates() {
        let sessions = vec![
            session("a", vec![marker(48.10010, 11.50010, Some("stop"), &[])], vec![]),
            session("b", vec![marker(48.10030, 11.50040, Some("stop"), &[])], vec![]),
        ];
        let result = aggregate_hotspots(&sessions, &HeatmapConfig::default());
        assert_eq!(result.hotspots.len(), 1);
        let h = &result.hotspots[0];
        assert_eq!(h.count, 2);
        assert!(approx_eq(h.latitude, 48.10020, 1e-9));
        assert!(approx_eq(h.longitude, 11.50025, 1e-9));
        assert_eq!(h.cluster_id, "48100_11500");
        assert_eq!(h.routes, vec!["a", "b"]);
    }

    #[test]
    fn test_grid_rounds_half_to_even() {
        let grid = HotspotGrid::new(2.0);
        assert_eq!(grid.to_grid_coords(0.25, -0.75), (0, -2));
        assert_eq!(grid.to_grid_coords(1.25, 1.3), (2, 3));
    }

    #[test]
    fn test_sorted_by_count_with_stable_ties() {
        let sessions = vec![session(
            "a",
            vec![
                marker(10.0, 10.0, Some("first"), &[]),
                marker(20.0, 20.0, Some("second"), &[]),
                marker(30.0, 30.0, Some("third"), &[]),
                marker(30.0, 30.0, Some("third"), &[]),
            ],
            vec![],
        )];
        let result = aggregate_hotspots(&sessions, &HeatmapConfig::default());
        let labels: Vec<&str> = result.hotspots.iter().map(|h| h.dominant_label.as_str()).collect();
        assert_eq!(labels, vec!["third", "first", "second"]);
    }

    #[test]
    fn test_labels_tags_and_sources() {
        let sessions = vec![session(
            "a",
            vec![
                ReviewMarker { label: Some("Tricky junction".into()), ..marker(1.0, 1.0, Some("hazard"), &["Merge"]) },
                marker(1.0, 1.0, None, &[]),
            ],
            vec![note(1.0, 1.0, &[]), note(1.0, 1.0, &["merge", "lights"])],
        )];
        let result = aggregate_hotspots(&sessions, &HeatmapConfig::default());
        let h = &result.hotspots[0];
        assert_eq!(h.count, 4);
        // "Voice note" reaches 2 after "Tricky junction" and "Key location" hit 1
        assert_eq!(h.dominant_label, "Voice note");
        assert_eq!(h.dominant_tag.as_deref(), Some("merge"));
        let tags: Vec<(&str, u32)> = h.tags.iter().map(|t| (t.label.as_str(), t.count)).collect();
        assert_eq!(tags, vec![("merge", 2), ("voice_note", 1), ("lights", 1)]);
        assert_eq!(
            serde_json::to_value(&h.source_breakdown).unwrap(),
            json!({"hazard": 1, "marker": 1, "voice_note": 2})
        );
        assert_eq!(result.tag_counts.get("merge"), 2);
    }

    #[test]
    fn test_unlocated_annotations_are_skipped() {
        let mut unlocated = marker(1.0, 1.0, Some("x"), &[]);
        unlocated.longitude = None;
        let sessions = vec![session("a", vec![unlocated], vec![AudioNote::default()])];
        let result = aggregate_hotspots(&sessions, &HeatmapConfig::default());
        assert!(result.hotspots.is_empty());
        assert!(result.tag_counts.is_empty());
    }

    #[test]
    fn test_tag_routes_include_raw_tags() {
        let mut unlocated = marker(0.0, 0.0, None, &["parking"]);
        unlocated.latitude = None;
        let sessions = vec![
            session("a", vec![marker(5.0, 5.0, Some("stop"), &[])], vec![]),
            session("b", vec![unlocated], vec![AudioNote::default()]),
        ];
        let aggregation = aggregate_hotspots(&sessions, &HeatmapConfig::default());
        let index = build_tag_routes(&aggregation.hotspots, &sessions);

        assert_eq!(index.routes("stop"), &["a".to_string()]);
        // Unlocated marker never reached a hotspot but still links its route
        assert_eq!(index.routes("parking"), &["b".to_string()]);
        // Untagged notes have no fallback in the raw pass
        assert!(index.routes("voice_note").is_empty());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_top_issues_cap_routes() {
        let sessions: Vec<Session> = (0..7)
            .map(|i| session(&format!("s{i}"), vec![marker(1.0, 1.0, None, &["merge"])], vec![]))
            .collect();
        let aggregation = aggregate_hotspots(&sessions, &HeatmapConfig::default());
        let index = build_tag_routes(&aggregation.hotspots, &sessions);
        let issues = top_issues(&aggregation.tag_counts, &index, &HeatmapConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].label, "merge");
        assert_eq!(issues[0].count, 7);
        assert_eq!(issues[0].routes, vec!["s0", "s1", "s2", "s3", "s4"]);
    }

    #[test]
    fn test_hotspots_matching_tag() {
        let sessions = vec![session(
            "a",
            vec![
                marker(1.0, 1.0, None, &["roundabout_exit"]),
                marker(2.0, 2.0, None, &["parking"]),
            ],
            vec![],
        )];
        let aggregation = aggregate_hotspots(&sessions, &HeatmapConfig::default());
        let found = hotspots_matching_tag(&aggregation.hotspots, " Roundabout ");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].dominant_tag.as_deref(), Some("roundabout_exit"));
        assert!(hotspots_matching_tag(&aggregation.hotspots, "").is_empty());
    }

    #[test]
    fn test_hotspot_index_nearest_within_radius() {
        let sessions = vec![session(
            "a",
            vec![
                marker(48.1000, 11.5000, Some("near"), &[]),
                marker(48.1050, 11.5000, Some("far"), &[]),
            ],
            vec![],
        )];
        let aggregation = aggregate_hotspots(&sessions, &HeatmapConfig::default());
        let index = HotspotIndex::new(&aggregation.hotspots);
        assert_eq!(index.len(), 2);

        let (hit, dist) = index.nearest(48.1001, 11.5000, 50.0).unwrap();
        assert_eq!(hit.dominant_label, "near");
        assert!(approx_eq(dist, 11.12, 0.05));

        assert!(index.nearest(48.1025, 11.5000, 100.0).is_none());
        assert_eq!(index.within(48.1025, 11.5000, 1_000.0).len(), 2);
        assert!(index.nearest(48.1, 11.5, -1.0).is_none());
    }

    #[test]
    fn test_hotspot_index_includes_radius_edge() {
        let sessions = vec![session("edge", vec![marker(0.0, 0.001, Some("edge"), &[])], vec![])];
        let aggregation = aggregate_hotspots(&sessions, &HeatmapConfig::default());
        let index = HotspotIndex::new(&aggregation.hotspots);

        let d = distance_meters(0.0, 0.0, 0.0, 0.001);
        assert_eq!(index.within(0.0, 0.0, d * 1.0005).len(), 1);
        assert_eq!(index.within(0.0, 0.0, d).len(), 1);
        assert!(index.within(0.0, 0.0, d * 0.999).is_empty());
    }

    #[test]
    fn test_hotspot_index_near_pole_and_antimeridian() {
        let sessions = vec![session(
            "polar",
            vec![
                marker(89.99, 0.0, Some("pole"), &[]),
                marker(10.0, 179.9995, Some("east"), &[]),
            ],
            vec![],
        )];
        let aggregation = aggregate_hotspots(&sessions, &HeatmapConfig::default());
        let index = HotspotIndex::new(&aggregation.hotspots);

        // Across the pole: same latitude, opposite meridian, about 2.2 km apart
        let polar = distance_meters(89.99, 180.0, 89.99, 0.0);
        let (hit, _) = index.nearest(89.99, 180.0, polar + 1.0).unwrap();
        assert_eq!(hit.dominant_label, "pole");

        let across = distance_meters(10.0, -179.9995, 10.0, 179.9995);
        let (hit, dist) = index.nearest(10.0, -179.9995, across + 1.0).unwrap();
        assert_eq!(hit.dominant_label, "east");
        assert!(approx_eq(dist, across, 1e-6));
    }

    #[test]
    fn test_empty_index() {
        let index = HotspotIndex::new(&[]);
        assert!(index.is_empty());
        assert!(index.nearest(0.0, 0.0, 1_000.0).is_none());
    }
}
