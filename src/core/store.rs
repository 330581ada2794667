//! Durable session store.
//!
//! The entire completed-session history round-trips as one JSON blob,
//! most recent first and length-capped. There is a single writer (the
//! session tracker), so whole-file replacement is safe.

use crate::core::session::FireAlertSession;
use std::path::PathBuf;

/// Session store errors.
#[derive(Debug)]
pub enum StoreError {
    Io(String),
    Parse(String),
    Serialize(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "Store IO error: {e}"),
            StoreError::Parse(e) => write!(f, "Store parse error: {e}"),
            StoreError::Serialize(e) => write!(f, "Store serialize error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Whole-collection JSON store for completed sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    cap: usize,
}

impl SessionStore {
    pub fn new(path: PathBuf, cap: usize) -> Self {
        Self {
            path,
            cap: cap.max(1),
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the persisted history, most recent first, capped.
    ///
    /// A missing file is an empty history, not an error.
    pub fn load(&self) -> Result<Vec<FireAlertSession>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| StoreError::Io(e.to_string()))?;
        let mut sessions: Vec<FireAlertSession> =
            serde_json::from_str(&content).map_err(|e| StoreError::Parse(e.to_string()))?;

        sessions.truncate(self.cap);
        Ok(sessions)
    }

    /// Overwrite the persisted collection with the capped list.
    pub fn save(&self, sessions: &[FireAlertSession]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let capped = &sessions[..sessions.len().min(self.cap)];
        let json = serde_json::to_string_pretty(capped)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;

        std::fs::write(&self.path, json).map_err(|e| StoreError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{RawReading, SensorReading};
    use uuid::Uuid;

    fn temp_store(cap: usize) -> SessionStore {
        let path = std::env::temp_dir()
            .join("firewatch-store-test")
            .join(format!("{}.json", Uuid::new_v4()));
        SessionStore::new(path, cap)
    }

    fn session(device: &str) -> FireAlertSession {
        let reading = SensorReading::from_raw(RawReading {
            device_id: Some(device.to_string()),
            temperature: Some(41.0),
            is_fire: Some(true),
            ..Default::default()
        });
        FireAlertSession::open(&reading, false)
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let store = temp_store(10);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let store = temp_store(10);
        let sessions = vec![session("DEV-1"), session("DEV-2")];

        store.save(&sessions).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].device_id, "DEV-1");
        assert_eq!(loaded[1].device_id, "DEV-2");
    }

    #[test]
    fn test_save_enforces_cap() {
        let store = temp_store(3);
        let sessions: Vec<FireAlertSession> =
            (0..6).map(|i| session(&format!("DEV-{i}"))).collect();

        store.save(&sessions).unwrap();
        let loaded = store.load().unwrap();

        // Exactly the cap survives, most recent first
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].device_id, "DEV-0");
        assert_eq!(loaded[2].device_id, "DEV-2");
    }

    #[test]
    fn test_corrupt_blob_is_parse_error() {
        let store = temp_store(10);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Parse(_))));
    }
}
