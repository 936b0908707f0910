//! I/O operations for benchmark results.
//!
//! A results directory holds one immutable `benchmark-<timestamp>.json`
//! snapshot per run plus `latest.json`, a copy of the most recent snapshot.
//!
//! The snapshot and the latest copy are two separate full-file writes. A crash
//! between them leaves `latest.json` pointing at the previous run.

use crate::markdown;
use crate::result::ResultSet;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default results directory, relative to the working directory.
pub const RESULTS_DIR: &str = "benchmarks/results";

/// File name of the latest pointer.
pub const LATEST_FILE: &str = "latest.json";

/// File name of the optional markdown report.
pub const SUMMARY_FILE: &str = "summary.md";

/// Prefix shared by all snapshot files.
pub const SNAPSHOT_PREFIX: &str = "benchmark-";

/// Extension shared by all snapshot files.
pub const SNAPSHOT_EXTENSION: &str = ".json";

/// Errors raised by the results store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem access failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A result set could not be encoded.
    #[error("Failed to encode results: {0}")]
    Encode(#[from] serde_json::Error),

    /// A stored file did not contain a valid result set.
    #[error("Failed to parse {}: {source}", .path.display())]
    Decode {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error means the requested file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// A persisted run.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Snapshot file name, e.g. `benchmark-2025-01-15T10-30-00-000Z.json`.
    pub filename: String,
    /// Full path of the snapshot file.
    pub path: PathBuf,
}

/// A stored snapshot paired with its parsed content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Snapshot file name.
    pub filename: String,
    /// Parsed result set.
    pub data: ResultSet,
}

/// Whether `filename` follows the snapshot naming convention.
pub fn is_snapshot_name(filename: &str) -> bool {
    filename.starts_with(SNAPSHOT_PREFIX) && filename.ends_with(SNAPSHOT_EXTENSION)
}

/// Snapshot file name for a run started at `at`.
///
/// The ISO-8601 timestamp has `:` and `.` replaced by `-` so the name is
/// portable across filesystems.
pub fn snapshot_filename(at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{SNAPSHOT_PREFIX}{stamp}{SNAPSHOT_EXTENSION}")
}

/// Ordering key for snapshot names: the timestamp stem, then the collision
/// counter, so `…000Z.json` precedes `…000Z-1.json`.
fn snapshot_order(filename: &str) -> (&str, u32) {
    let stem = filename.strip_suffix(SNAPSHOT_EXTENSION).unwrap_or(filename);
    if let Some((base, counter)) = stem.rsplit_once('-') {
        if base.ends_with('Z') {
            if let Ok(counter) = counter.parse() {
                return (base, counter);
            }
        }
    }
    (stem, 0)
}

/// Write `bytes` to a freshly created file, removing it if the write fails so
/// no truncated snapshot is left behind.
fn write_or_discard(mut file: impl Write, path: &Path, bytes: &[u8]) -> Result<()> {
    if let Err(e) = file.write_all(bytes).and_then(|()| file.flush()) {
        drop(file);
        if let Err(remove) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %remove, "Failed to remove partial snapshot");
        }
        return Err(StoreError::io(path, e));
    }
    Ok(())
}

/// Append-plus-pointer store rooted at a results directory.
#[derive(Debug, Clone)]
pub struct ResultsStore {
    dir: PathBuf,
}

impl ResultsStore {
    /// Create a store rooted at `dir`. Nothing is touched until first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The results directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the latest pointer.
    pub fn latest_path(&self) -> PathBuf {
        self.dir.join(LATEST_FILE)
    }

    /// Persist `results` as a new snapshot stamped with the current time and
    /// point `latest.json` at it.
    pub fn persist(&self, results: &ResultSet) -> Result<Snapshot> {
        self.persist_at(results, Utc::now())
    }

    /// Persist `results` as a snapshot stamped with `at`.
    pub fn persist_at(&self, results: &ResultSet, at: DateTime<Utc>) -> Result<Snapshot> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let json = serde_json::to_string_pretty(results)?;

        let snapshot = self.write_snapshot(&snapshot_filename(at), &json)?;
        info!(path = %snapshot.path.display(), "Results saved");

        let latest = self.latest_path();
        fs::write(&latest, &json).map_err(|e| StoreError::io(&latest, e))?;
        info!(path = %latest.display(), "Latest results saved");

        Ok(snapshot)
    }

    fn write_snapshot(&self, filename: &str, json: &str) -> Result<Snapshot> {
        let stem = filename.trim_end_matches(SNAPSHOT_EXTENSION);
        let mut candidate = filename.to_string();
        let mut attempt = 0u32;

        // Snapshots are never overwritten; same-millisecond runs get a suffix.
        loop {
            let path = self.dir.join(&candidate);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    write_or_discard(file, &path, json.as_bytes())?;
                    return Ok(Snapshot {
                        filename: candidate,
                        path,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    attempt += 1;
                    debug!(path = %path.display(), attempt, "Snapshot name taken");
                    candidate = format!("{stem}-{attempt}{SNAPSHOT_EXTENSION}");
                }
                Err(e) => return Err(StoreError::io(&path, e)),
            }
        }
    }

    /// Read the result set behind the latest pointer.
    pub fn read_latest(&self) -> Result<ResultSet> {
        read_results_json(self.latest_path())
    }

    /// Read every snapshot in the results directory, ordered by file name
    /// (same-millisecond runs by collision counter).
    ///
    /// Files not following the snapshot naming convention are ignored. A
    /// snapshot that fails to parse fails the whole listing.
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotEntry>> {
        let mut filenames = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))? {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            if let Some(name) = entry.file_name().to_str() {
                if is_snapshot_name(name) {
                    filenames.push(name.to_string());
                }
            }
        }
        filenames.sort_by(|a, b| {
            snapshot_order(a)
                .cmp(&snapshot_order(b))
                .then_with(|| a.cmp(b))
        });

        filenames
            .into_iter()
            .map(|filename| {
                let data = read_results_json(self.dir.join(&filename))?;
                Ok(SnapshotEntry { filename, data })
            })
            .collect()
    }

    /// Write the markdown report for `results` next to the snapshots.
    pub fn write_summary(&self, results: &ResultSet) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let path = self.dir.join(SUMMARY_FILE);
        fs::write(&path, markdown::render_report(results)).map_err(|e| StoreError::io(&path, e))?;
        Ok(path)
    }
}

impl Default for ResultsStore {
    fn default() -> Self {
        Self::new(RESULTS_DIR)
    }
}

/// Read a result set from a JSON file.
pub fn read_results_json(path: impl AsRef<Path>) -> Result<ResultSet> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&content).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
