//! crates/focuspoint_core/src/persistence.rs
//!
//! Local durable storage for the store snapshot. Writes are synchronous: a
//! mutation is only considered done once the whole snapshot is on disk.

use crate::domain::Snapshot;
use crate::error::PersistenceError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait SnapshotStore: Send + Sync {
    /// Returns `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Snapshot>, PersistenceError>;

    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError>;
}

/// Stores the snapshot as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the snapshot file location.
    ///
    /// The path is determined in the following order:
    /// 1. `FOCUSPOINT_STATE` environment variable.
    /// 2. `./focuspoint-storage.json`.
    pub fn default_path() -> PathBuf {
        std::env::var("FOCUSPOINT_STATE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("focuspoint-storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Writes to a sibling temp file and renames it over the old one so a crash
    /// mid-write never leaves a truncated snapshot.
    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let s = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        f.write_all(s.as_bytes())?;
        f.sync_all()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Keeps the serialized snapshot in memory. Useful for tests and previews.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    blob: Mutex<Option<String>>,
}

impl InMemorySnapshotStore {
    pub fn with_snapshot(snapshot: &Snapshot) -> Result<Self, PersistenceError> {
        let blob = serde_json::to_string(snapshot)?;
        Ok(Self { blob: Mutex::new(Some(blob)) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, PersistenceError> {
        self.blob.lock().map_err(|error| {
            PersistenceError::Io(std::io::Error::other(format!("snapshot lock poisoned: {error}")))
        })
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        let blob = self.lock()?;
        match blob.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(snapshot)?;
        *self.lock()? = Some(raw);
        Ok(())
    }
}
