//! Snapshot persistence.
//!
//! A snapshot is the whole workspace state as one JSON document:
//!
//! ```json
//! { "version": "1.0.0", "exportDate": "...", "tasks": [...],
//!   "config": { "customTags": [], "projectRules": [], "blacklist": [] },
//!   "metadata": { "projects": [], "people": [] } }
//! ```
//!
//! Loading is lenient: only `tasks` is required, and unknown fields are
//! ignored. Ticket fields missing from older snapshots take their defaults.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, TrackerError};
use crate::model::{ProjectRule, Ticket};

/// Snapshot format version written by this build.
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// User configuration section of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotConfig {
    pub custom_tags: Vec<String>,
    pub project_rules: Vec<ProjectRule>,
    pub blacklist: Vec<String>,
}

/// Derived facts, informational only. Recomputed on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotMetadata {
    pub projects: Vec<String>,
    pub people: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "Utc::now")]
    pub export_date: DateTime<Utc>,
    pub tasks: Vec<Ticket>,
    #[serde(default)]
    pub config: SnapshotConfig,
    #[serde(default)]
    pub metadata: SnapshotMetadata,
}

fn default_version() -> String {
    SNAPSHOT_VERSION.to_string()
}

impl Snapshot {
    #[must_use]
    pub fn new(tasks: Vec<Ticket>, config: SnapshotConfig, metadata: SnapshotMetadata) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            export_date: Utc::now(),
            tasks,
            config,
            metadata,
        }
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` when the text is not a JSON object, `tasks` is
    /// missing or not a list, or a ticket lacks its key.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| TrackerError::InvalidFormat {
                reason: e.to_string(),
            })?;

        let Some(object) = value.as_object() else {
            return Err(TrackerError::InvalidFormat {
                reason: "snapshot must be a JSON object".to_string(),
            });
        };
        match object.get("tasks") {
            Some(serde_json::Value::Array(_)) => {}
            Some(_) => {
                return Err(TrackerError::InvalidFormat {
                    reason: "'tasks' must be a list".to_string(),
                });
            }
            None => {
                return Err(TrackerError::InvalidFormat {
                    reason: "missing 'tasks'".to_string(),
                });
            }
        }

        let snapshot: Self =
            serde_json::from_value(value).map_err(|e| TrackerError::InvalidFormat {
                reason: e.to_string(),
            })?;

        check_version(&snapshot.version);
        debug!(
            version = %snapshot.version,
            tasks = snapshot.tasks.len(),
            "Parsed snapshot"
        );
        Ok(snapshot)
    }
}

/// Warn when a snapshot comes from a newer major format.
fn check_version(version: &str) {
    let (Ok(ours), Ok(theirs)) = (
        semver::Version::parse(SNAPSHOT_VERSION),
        semver::Version::parse(version.trim()),
    ) else {
        warn!(version, "Snapshot version is not semver; loading best-effort");
        return;
    };
    if theirs.major > ours.major {
        warn!(
            snapshot = %theirs,
            supported = %ours,
            "Snapshot was written by a newer format; loading best-effort"
        );
    }
}

/// Destination for persisted snapshots.
pub trait SnapshotSink {
    /// Persist a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn persist(&mut self, snapshot: &Snapshot) -> Result<()>;
}

/// Writes snapshots to a JSON file, atomically via a temp sibling.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot back. A missing file is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error or `InvalidFormat` if the file is unreadable.
    pub fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        Snapshot::from_json(&text).map(Some)
    }
}

impl SnapshotSink for FileSink {
    fn persist(&mut self, snapshot: &Snapshot) -> Result<()> {
        let json = snapshot.to_json()?;
        let temp_path = self.path.with_extension("json.tmp");

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        debug!(path = %self.path.display(), tasks = snapshot.tasks.len(), "Snapshot written");
        Ok(())
    }
}

/// Keeps every persisted snapshot in memory. Used by tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub saved: Vec<Snapshot>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Snapshot> {
        self.saved.last()
    }
}

impl SnapshotSink for MemorySink {
    fn persist(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.saved.push(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_tasks_is_invalid_format() {
        let err = Snapshot::from_json(r#"{"version": "1.0.0"}"#).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidFormat { .. }));
        let err = Snapshot::from_json(r#"{"tasks": {}}"#).unwrap_err();
        assert!(err.to_string().contains("list"));
        let err = Snapshot::from_json("[]").unwrap_err();
        assert!(matches!(err, TrackerError::InvalidFormat { .. }));
        let err = Snapshot::from_json("not json").unwrap_err();
        assert!(matches!(err, TrackerError::InvalidFormat { .. }));
    }

    #[test]
    fn config_defaults_to_empty() {
        let snapshot = Snapshot::from_json(r#"{"tasks": [{"key": "A-1"}]}"#).unwrap();
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.config, SnapshotConfig::default());
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
    }

    #[test]
    fn ticket_without_key_is_invalid() {
        let err = Snapshot::from_json(r#"{"tasks": [{"summary": "x"}]}"#).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidFormat { .. }));
    }

    #[test]
    fn newer_major_version_still_loads() {
        let snapshot =
            Snapshot::from_json(r#"{"version": "9.0.0", "tasks": [], "extra": true}"#).unwrap();
        assert_eq!(snapshot.version, "9.0.0");
    }

    #[test]
    fn file_sink_writes_atomically() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("tasks.json");
        let mut sink = FileSink::new(&path);
        assert!(sink.load().unwrap().is_none());

        let snapshot = Snapshot::new(
            vec![Ticket::new("A-1", "Hello")],
            SnapshotConfig::default(),
            SnapshotMetadata::default(),
        );
        sink.persist(&snapshot).unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        let loaded = sink.load().unwrap().unwrap();
        assert_eq!(loaded.tasks, snapshot.tasks);
    }

    #[test]
    fn memory_sink_records_each_persist() {
        let mut sink = MemorySink::new();
        let snapshot = Snapshot::new(Vec::new(), SnapshotConfig::default(), SnapshotMetadata::default());
        sink.persist(&snapshot).unwrap();
        sink.persist(&snapshot).unwrap();
        assert_eq!(sink.saved.len(), 2);
        assert!(sink.last().is_some());
    }
}
