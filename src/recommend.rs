//! Practice focus recommendations drawn from the busiest hotspots.

use serde::{Deserialize, Serialize};

use crate::heatmap::{Hotspot, TagRouteIndex};
use crate::tags::title_case;

const DEFAULT_FOCUS_TAG: &str = "focus area";
const DEFAULT_FALLBACK_LABEL: &str = "Practice hotspot";

/// Configuration for focus recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Leading hotspots considered (default: 5)
    pub candidate_hotspots: usize,
    /// Recommendations returned at most (default: 3)
    pub max_recommendations: usize,
    /// Related routes attached per recommendation (default: 3)
    pub max_related_routes: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            candidate_hotspots: 5,
            max_recommendations: 3,
            max_related_routes: 3,
        }
    }
}

/// A suggested area to practise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub label: String,
    pub tag: Option<String>,
    pub reason: String,
    pub latitude: f64,
    pub longitude: f64,
    pub routes: Vec<String>,
}

fn from_hotspot(hotspot: &Hotspot, tag_routes: &TagRouteIndex, config: &RecommendationConfig) -> Option<Recommendation> {
    if hotspot.count == 0 {
        return None;
    }

    let label = Some(hotspot.dominant_label.as_str()).filter(|l| !l.is_empty());
    let tag = match hotspot.dominant_tag.as_deref().filter(|t| !t.is_empty()) {
        Some(tag) => tag.to_string(),
        None => label.map_or_else(|| DEFAULT_FOCUS_TAG.to_string(), str::to_lowercase),
    };
    let reason = match label {
        Some(label) => format!("'{}' has been flagged {} times", label, hotspot.count),
        None => format!("Recurring events tagged '{}'", tag),
    };
    let routes = tag_routes.routes(&tag).iter().take(config.max_related_routes).cloned().collect();

    Some(Recommendation {
        label: label.map_or_else(|| title_case(&tag), str::to_string),
        tag: Some(tag),
        reason,
        latitude: hotspot.latitude,
        longitude: hotspot.longitude,
        routes,
    })
}

fn fallback(top: &Hotspot, config: &RecommendationConfig) -> Recommendation {
    let label = if top.dominant_label.is_empty() {
        DEFAULT_FALLBACK_LABEL.to_string()
    } else {
        top.dominant_label.clone()
    };
    Recommendation {
        label,
        tag: top.dominant_tag.clone(),
        reason: format!("High activity area with {} events logged.", top.count),
        latitude: top.latitude,
        longitude: top.longitude,
        routes: top.routes.iter().take(config.max_related_routes).cloned().collect(),
    }
}

/// Suggest focus areas from `hotspots` (sorted by descending count).
///
/// Each of the leading `candidate_hotspots` entries yields a recommendation
/// tagged with its dominant tag, or its lowercased label, or `"focus area"`.
/// Related routes come from `tag_routes`. Collection stops at
/// `max_recommendations`. When no candidate is usable, the busiest hotspot
/// is recommended on its own.
///
/// ```rust
/// use drive_analytics::RecommendationConfig;
/// use drive_analytics::heatmap::TagRouteIndex;
/// use drive_analytics::recommend::recommend_focus_areas;
///
/// let none = recommend_focus_areas(&[], &TagRouteIndex::new(), &RecommendationConfig::default());
/// assert!(none.is_empty());
/// ```
pub fn recommend_focus_areas(
    hotspots: &[Hotspot],
    tag_routes: &TagRouteIndex,
    config: &RecommendationConfig,
) -> Vec<Recommendation> {
    let Some(top) = hotspots.first() else {
        return Vec::new();
    };

    let mut recommendations = Vec::new();
    for hotspot in hotspots.iter().take(config.candidate_hotspots) {
        if recommendations.len() >= config.max_recommendations {
            break;
        }
        if let Some(rec) = from_hotspot(hotspot, tag_routes, config) {
            recommendations.push(rec);
        }
    }

    if recommendations.is_empty() && config.max_recommendations > 0 {
        recommendations.push(fallback(top, config));
    }
    recommendations
}
