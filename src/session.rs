//! Session records as uploaded by the mobile client.
//!
//! Deserialisation is deliberately forgiving: coordinates may arrive as
//! numbers or numeric strings, nullable collections default to empty, and tags
//! may be a list or a string. Anything the analytics cannot use is dropped
//! later, sample by sample, rather than rejecting the whole record.
//!
//! ```rust
//! use drive_analytics::Session;
//!
//! let session: Session = serde_json::from_str(r#"{
//!     "session_id": "session_1",
//!     "gps_points": [{"latitude": "48.1", "longitude": 11.5, "timestamp": "2024-05-01T10:00:00Z"}],
//!     "audio_notes": null
//! }"#).unwrap();
//! assert_eq!(session.gps_points[0].latitude, Some(48.1));
//! assert!(session.audio_notes.is_empty());
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AnalysisError, Result};

// =============================================================================
// Lenient field decoders
// =============================================================================

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Number or numeric string; anything else becomes `None`.
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

/// Numbers only; strings, booleans and null mean "not reported".
fn numeric_only<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
        _ => None,
    })
}

/// Any JSON scalar rendered as a string (ids are sometimes numeric).
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

// =============================================================================
// Records
// =============================================================================

/// Tags as they arrive: a list, a single string, or something unusable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTags {
    List(Vec<serde_json::Value>),
    Text(String),
    Other(serde_json::Value),
}

/// One GPS fix. `speed` is ground speed in m/s when the device reported it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsSample {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "numeric_only")]
    pub speed: Option<f64>,
}

impl GpsSample {
    pub fn new(latitude: f64, longitude: f64, timestamp: &str, speed: Option<f64>) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            timestamp: Some(timestamp.to_string()),
            speed,
        }
    }
}

/// A point the learner flagged for later review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewMarker {
    #[serde(default, deserialize_with = "lenient_string")]
    pub marker_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<RawTags>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ReviewMarker {
    /// The marker type when present and non-empty.
    pub fn kind(&self) -> Option<&str> {
        non_empty(&self.kind)
    }

    /// Display label: explicit label, else type, else `"Key location"`.
    pub fn display_label(&self) -> &str {
        non_empty(&self.label).or_else(|| self.kind()).unwrap_or("Key location")
    }

    /// Source bucket used in hotspot breakdowns: type, else `"marker"`.
    pub fn source_key(&self) -> &str {
        self.kind().unwrap_or("marker")
    }
}

/// A voice note recorded while driving.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioNote {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub tags: Option<RawTags>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration_ms: Option<f64>,
}

impl AudioNote {
    /// Transcript when non-empty.
    pub fn transcript(&self) -> Option<&str> {
        non_empty(&self.transcript)
    }
}

/// A full recording session.
///
/// `session_id` is required by contract; an empty identifier is rejected by
/// [`Session::validate`] rather than silently analysed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, deserialize_with = "null_as_default")]
    pub session_id: String,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_duration_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_distance_km: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gps_points: Vec<GpsSample>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub audio_notes: Vec<AudioNote>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub review_markers: Vec<ReviewMarker>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
}

impl Session {
    /// Create an empty session with the given identifier.
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            ..Self::default()
        }
    }

    /// Reject records the storage layer should never have produced.
    pub fn validate(&self) -> Result<()> {
        if self.session_id.trim().is_empty() {
            return Err(AnalysisError::MissingSessionId);
        }
        Ok(())
    }

    /// Recorded duration in minutes, 0 when absent.
    pub fn duration_min(&self) -> f64 {
        self.total_duration_min.unwrap_or(0.0)
    }

    /// Recorded distance in kilometers, 0 when absent.
    pub fn distance_km(&self) -> f64 {
        self.total_distance_km.unwrap_or(0.0)
    }
}

// =============================================================================
// Listing summary
// =============================================================================

/// First or last fix of a session, formatted for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSummary {
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
    pub timestamp: Option<String>,
}

/// One row of the session listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub route_id: String,
    pub device_id: Option<String>,
    pub status: String,
    pub recorded_at: Option<String>,
    pub completed_at: Option<String>,
    pub duration_min: f64,
    pub distance_km: f64,
    pub gps_points_count: usize,
    pub audio_notes_count: usize,
    pub start_location: Option<LocationSummary>,
    pub end_location: Option<LocationSummary>,
    pub last_updated: Option<String>,
    pub preview_url: Option<String>,
    pub source: String,
}

fn format_location(sample: Option<&GpsSample>) -> Option<LocationSummary> {
    let sample = sample?;
    let (latitude, longitude) = (sample.latitude?, sample.longitude?);
    Some(LocationSummary {
        latitude,
        longitude,
        description: format!("{:.5}, {:.5}", latitude, longitude),
        timestamp: sample.timestamp.clone(),
    })
}

/// Build the listing row for a session. Start and end are the first and last
/// samples as uploaded, not re-sorted.
pub fn summarize_session(session: &Session) -> SessionSummary {
    SessionSummary {
        route_id: session.session_id.clone(),
        device_id: session.device_id.clone(),
        status: session.status.clone().unwrap_or_else(|| "unknown".to_string()),
        recorded_at: session.start_time.clone(),
        completed_at: session.end_time.clone(),
        duration_min: session.duration_min(),
        distance_km: session.distance_km(),
        gps_points_count: session.gps_points.len(),
        audio_notes_count: session.audio_notes.len(),
        start_location: format_location(session.gps_points.first()),
        end_location: format_location(session.gps_points.last()),
        last_updated: session.last_updated.clone(),
        preview_url: session.preview_url.clone(),
        source: session.source.clone().unwrap_or_else(|| "unknown".to_string()),
    }
}
