//! Session storage seam.
//!
//! The analytics core reads sessions through [`SessionStore`] and never
//! mutates what it reads. Two implementations ship with the crate: an
//! in-memory map for embedding and tests, and a directory of
//! `<session_id>.json` files matching the mobile upload layout.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::{debug, warn};

use crate::error::{AnalysisError, Result};
use crate::geo_utils::parse_optional_timestamp;
use crate::session::Session;

/// Read/write access to session records.
pub trait SessionStore: Send + Sync {
    /// Load one session, `Ok(None)` when it does not exist.
    fn get(&self, session_id: &str) -> Result<Option<Session>>;

    /// All sessions, most recent `start_time` first.
    fn list(&self) -> Result<Vec<Session>>;

    /// Insert or replace a session.
    fn save(&self, session: &Session) -> Result<()>;
}

/// Newest first; sessions without a parseable start time go last.
fn sort_recent_first(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| {
        let ta = parse_optional_timestamp(a.start_time.as_deref());
        let tb = parse_optional_timestamp(b.start_time.as_deref());
        tb.cmp(&ta)
    });
}

fn check_session_id(session_id: &str) -> Result<()> {
    if session_id.trim().is_empty() {
        return Err(AnalysisError::MissingSessionId);
    }
    if session_id.contains(['/', '\\']) || session_id == "." || session_id == ".." {
        return Err(AnalysisError::InvalidSessionId(session_id.to_string()));
    }
    Ok(())
}

// =============================================================================
// In-memory
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `sessions`; later duplicates replace earlier ones.
    pub fn with_sessions(sessions: impl IntoIterator<Item = Session>) -> Result<Self> {
        let store = Self::new();
        for session in sessions {
            store.save(&session)?;
        }
        Ok(store)
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session_id: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        Ok(sessions.get(session_id).cloned())
    }

    fn list(&self) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<Session> = sessions.values().cloned().collect();
        // Ties in start time fall back to id for a stable listing
        all.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        sort_recent_first(&mut all);
        Ok(all)
    }

    fn save(&self, session: &Session) -> Result<()> {
        session.validate()?;
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(session.session_id.clone(), session.clone());
        Ok(())
    }
}

// =============================================================================
// JSON directory
// =============================================================================

/// One `<session_id>.json` file per session under a root directory.
#[derive(Debug, Clone)]
pub struct JsonDirSessionStore {
    root: PathBuf,
}

impl JsonDirSessionStore {
    /// Open `root`, creating it when missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, session_id: &str) -> Result<PathBuf> {
        check_session_id(session_id)?;
        Ok(self.root.join(format!("{}.json", session_id)))
    }

    fn read_file(path: &Path) -> Result<Session> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl SessionStore for JsonDirSessionStore {
    fn get(&self, session_id: &str) -> Result<Option<Session>> {
        let path = self.path_for(session_id)?;
        if !path.is_file() {
            return Ok(None);
        }
        let mut session = Self::read_file(&path)?;
        if session.session_id.trim().is_empty() {
            session.session_id = session_id.to_string();
        }
        Ok(Some(session))
    }

    fn list(&self) -> Result<Vec<Session>> {
        let mut sessions = Vec::new();
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            match Self::read_file(&path) {
                Ok(mut session) => {
                    if session.session_id.trim().is_empty() {
                        match path.file_stem().and_then(|s| s.to_str()) {
                            Some(stem) => session.session_id = stem.to_string(),
                            None => continue,
                        }
                    }
                    sessions.push(session);
                }
                Err(e) => warn!("store: skipping {}: {}", path.display(), e),
            }
        }

        sort_recent_first(&mut sessions);
        debug!("store: listed {} sessions from {}", sessions.len(), self.root.display());
        Ok(sessions)
    }

    fn save(&self, session: &Session) -> Result<()> {
        session.validate()?;
        let path = self.path_for(&session.session_id)?;
        let body = serde_json::to_string_pretty(session)?;
        fs::write(&path, body)?;
        debug!("store: saved {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("drive-analytics-store-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn dated(id: &str, start: Option<&str>) -> Session {
        let mut s = Session::new(id);
        s.start_time = start.map(str::to_string);
        s
    }

    #[test]
    fn test_memory_store_roundtrip_and_order() {
        let store = InMemorySessionStore::with_sessions(vec![
            dated("old", Some("2024-01-01T08:00:00Z")),
            dated("undated", None),
            dated("new", Some("2024-06-01T08:00:00+02:00")),
        ])
        .unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.session_id).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
        assert!(store.get("old").unwrap().is_some());
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_rejects_missing_id() {
        let store = InMemorySessionStore::new();
        assert!(matches!(store.save(&Session::default()), Err(AnalysisError::MissingSessionId)));
    }

    #[test]
    fn test_json_dir_store() {
        let root = temp_root("dir");
        let store = JsonDirSessionStore::open(&root).unwrap();

        store.save(&dated("a", Some("2024-01-01T08:00:00Z"))).unwrap();
        store.save(&dated("b", Some("2024-02-01T08:00:00Z"))).unwrap();
        fs::write(root.join("broken.json"), "{not json").unwrap();
        fs::write(root.join("notes.txt"), "ignored").unwrap();
        fs::write(root.join("legacy.json"), r#"{"start_time": "2023-12-01T08:00:00Z"}"#).unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.session_id).collect();
        assert_eq!(ids, vec!["b", "a", "legacy"]);

        let loaded = store.get("a").unwrap().unwrap();
        assert_eq!(loaded.start_time.as_deref(), Some("2024-01-01T08:00:00Z"));
        assert!(store.get("zzz").unwrap().is_none());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_json_dir_blank_id_takes_file_stem() {
        let root = temp_root("blank");
        let store = JsonDirSessionStore::open(&root).unwrap();
        fs::write(root.join("good.json"), r#"{"session_id": "good"}"#).unwrap();
        fs::write(root.join("odd.json"), r#"{"session_id": " "}"#).unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.session_id).collect();
        assert_eq!(ids, vec!["good", "odd"]);
        assert_eq!(store.get("odd").unwrap().unwrap().session_id, "odd");

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_json_dir_rejects_path_ids() {
        let root = temp_root("ids");
        let store = JsonDirSessionStore::open(&root).unwrap();
        assert!(matches!(store.get("../etc/passwd"), Err(AnalysisError::InvalidSessionId(_))));
        assert!(matches!(store.save(&Session::new("a/b")), Err(AnalysisError::InvalidSessionId(_))));
        assert!(matches!(store.get(" "), Err(AnalysisError::MissingSessionId)));
        let _ = fs::remove_dir_all(&root);
    }
}
