//! Tag normalisation and insertion-ordered frequency tables.
//!
//! Tags are free-form strings typed or spoken by the learner. They are
//! compared case-insensitively after trimming, and every ranking over them
//! breaks ties by first appearance, so the same input always yields the same
//! "dominant" tag.

use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::session::RawTags;

/// A label with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub label: String,
    pub count: u32,
}

/// Counter that remembers the order in which keys were first seen.
///
/// Serialises as a JSON object whose keys follow insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<(String, u32)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `key`.
    pub fn add(&mut self, key: &str) {
        self.add_n(key, 1);
    }

    /// Count `n` occurrences of `key`.
    pub fn add_n(&mut self, key: &str, n: u32) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += n,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), n));
            }
        }
    }

    pub fn get(&self, key: &str) -> u32 {
        self.index.get(key).map_or(0, |&i| self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(k, n)| (k.as_str(), *n))
    }

    /// Up to `limit` entries by descending count; ties keep insertion order.
    pub fn most_common(&self, limit: usize) -> Vec<TagCount> {
        let mut ranked: Vec<&(String, u32)> = self.entries.iter().collect();
        // Stable sort keeps first-seen order among equal counts
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(limit)
            .map(|(label, count)| TagCount { label: label.clone(), count: *count })
            .collect()
    }

    /// The most frequent key, first-seen wins ties.
    pub fn mode(&self) -> Option<&str> {
        let mut best: Option<&(String, u32)> = None;
        for entry in &self.entries {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(k, _)| k.as_str())
    }
}

impl Serialize for FrequencyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

fn clean(item: &str) -> Option<String> {
    let trimmed = item.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

fn clean_values(items: &[serde_json::Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|value| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => clean(s),
            other => clean(&other.to_string()),
        })
        .collect()
}

/// Normalise raw tags to trimmed lowercase strings.
///
/// Lists are taken item by item; strings are read as a JSON-encoded list when
/// bracketed, otherwise split on commas. When nothing remains and `fallback`
/// is non-empty, the result is the lowercased fallback alone.
///
/// ```rust
/// use drive_analytics::session::RawTags;
/// use drive_analytics::tags::normalize_tags;
///
/// let raw = RawTags::Text(" Roundabout, Merge ,".to_string());
/// assert_eq!(normalize_tags(Some(&raw), None), vec!["roundabout", "merge"]);
/// assert_eq!(normalize_tags(None, Some("Voice_Note")), vec!["voice_note"]);
/// ```
pub fn normalize_tags(raw: Option<&RawTags>, fallback: Option<&str>) -> Vec<String> {
    let mut tags = match raw {
        Some(RawTags::List(items)) => clean_values(items),
        Some(RawTags::Text(text)) => {
            let mut parsed = Vec::new();
            if text.starts_with('[') && text.ends_with(']') {
                if let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(text) {
                    parsed = clean_values(&items);
                }
            }
            if parsed.is_empty() {
                parsed = text.split(',').filter_map(clean).collect();
            }
            parsed
        }
        Some(RawTags::Other(_)) | None => Vec::new(),
    };

    if tags.is_empty() {
        if let Some(fb) = fallback.filter(|f| !f.is_empty()) {
            tags.push(fb.to_lowercase());
        }
    }
    tags
}

/// Loose tag predicate used to link hotspots to tagged route segments.
///
/// True when both tags are non-empty and one equals or contains the other,
/// e.g. `"roundabout"` matches `"roundabout_exit"`. Comparison is on the
/// strings as given; callers pass normalised tags.
pub fn tags_loosely_match(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(b) || b.contains(a)
}

/// Title-case each whitespace or underscore separated word (`"lane_change"` -> `"Lane_Change"`).
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
