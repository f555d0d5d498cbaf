//! Snapshot model and on-disk snapshot store

use crate::error::{QuerywatchError, Result};
use crate::fingerprint::Fingerprints;
use crate::hash::{HashComputer, HashValue};
use crate::value::Row;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One row of a query result together with its content hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    pub hash: HashValue,
    pub value: Row,
}

impl DataItem {
    pub fn new(computer: &HashComputer, value: Row) -> Self {
        Self {
            hash: computer.hash_row(&value),
            value,
        }
    }
}

/// The full result of one run, as persisted for the next
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: String,
    pub fingerprint: HashValue,
    pub executable_fingerprint: HashValue,
    pub created: DateTime<Utc>,
    pub items: Vec<DataItem>,
}

impl Snapshot {
    pub fn new(fingerprints: &Fingerprints, items: Vec<DataItem>) -> Self {
        Self {
            format_version: crate::FORMAT_VERSION.to_string(),
            fingerprint: fingerprints.config.clone(),
            executable_fingerprint: fingerprints.executable.clone(),
            created: Utc::now(),
            items,
        }
    }

    /// Whether this snapshot was written for the same settings, by the same
    /// build, in the current format
    pub fn matches(&self, fingerprints: &Fingerprints) -> bool {
        self.format_version == crate::FORMAT_VERSION
            && self.fingerprint == fingerprints.config
            && self.executable_fingerprint == fingerprints.executable
    }

    pub fn row_count(&self) -> usize {
        self.items.len()
    }
}

/// A snapshot read back from disk
#[derive(Debug, Clone)]
pub struct StoredSnapshot {
    pub snapshot: Snapshot,
    pub modified: Option<DateTime<Local>>,
}

impl StoredSnapshot {
    /// "since <time> (<n> hours ago)" relative to `now`
    pub fn since_text(&self, now: DateTime<Local>) -> String {
        match self.modified {
            Some(modified) => format!(
                "since {} ({} hours ago)",
                modified.format("%Y-%m-%d %H:%M:%S"),
                hours_between(modified, now)
            ),
            None => String::new(),
        }
    }
}

/// Hours elapsed, rounded to one decimal place
pub fn hours_between(earlier: DateTime<Local>, later: DateTime<Local>) -> f64 {
    let hours = (later - earlier).num_seconds() as f64 / 3600.0;
    (hours * 10.0).round() / 10.0
}

/// File-backed store holding the last snapshot
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the previous snapshot. Missing or unreadable files mean there is
    /// no history, never an error.
    pub fn load(&self) -> Option<StoredSnapshot> {
        if !self.exists() {
            log::debug!("No snapshot at {}", self.path.display());
            return None;
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Failed to read snapshot {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<Snapshot>(&content) {
            Ok(snapshot) => Some(StoredSnapshot {
                snapshot,
                modified: self.last_modified(),
            }),
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable snapshot {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Replace the stored snapshot.
    ///
    /// The JSON is written to a temporary file next to the target and then
    /// renamed over it, so readers see either the old or the new snapshot.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)?;
        serde_json::to_writer_pretty(temp.as_file_mut(), snapshot)?;
        temp.as_file_mut().flush()?;
        temp.as_file().sync_all()?;

        temp.persist(&self.path).map_err(|e| {
            QuerywatchError::snapshot(format!(
                "Failed to replace snapshot {}: {}",
                self.path.display(),
                e.error
            ))
        })?;

        log::debug!(
            "Stored {} rows in {}",
            snapshot.row_count(),
            self.path.display()
        );
        Ok(())
    }

    /// Last modification time of the snapshot file
    pub fn last_modified(&self) -> Option<DateTime<Local>> {
        fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Local>::from)
    }
}
