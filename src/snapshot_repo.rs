// Snapshot store: the producer's `metrics_<ts>.json` files in the data directory.
// Reads are synchronous; async callers go through `run_blocking` for the I/O timeout.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use tracing::instrument;

use crate::error::ProcessorError;
use crate::files::{self, ALERTS_LOG, FileKind};
use crate::models::Snapshot;

/// Snapshots read for one window, keyed by filename timestamp.
#[derive(Debug, Default)]
pub struct LoadedWindow {
    pub snapshots: BTreeMap<i64, Snapshot>,
    /// Files skipped as malformed: bad name, unreadable, vanished or unparseable body.
    pub skipped: usize,
}

/// Snapshot bodies exactly as the producer wrote them, ascending by filename timestamp.
#[derive(Debug, Default)]
pub struct RawWindow {
    pub snapshots: Vec<Value>,
    pub skipped: usize,
}

pub struct SnapshotRepo {
    data_dir: PathBuf,
}

impl SnapshotRepo {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Like `new`, creating the directory if missing.
    pub fn open(data_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let repo = Self::new(data_dir);
        fs::create_dir_all(&repo.data_dir)?;
        Ok(repo)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// All snapshot files named at or after `start_ts`. Fails only if the directory
    /// cannot be listed; any single bad file is skipped and counted.
    #[instrument(skip(self), fields(repo = "snapshots", operation = "load_since"))]
    pub fn load_since(&self, start_ts: i64) -> Result<LoadedWindow, ProcessorError> {
        let listing = files::list(&self.data_dir, FileKind::Snapshot)?;
        let mut window = LoadedWindow {
            skipped: listing.malformed,
            ..Default::default()
        };
        for file in listing.files.into_iter().filter(|f| f.timestamp >= start_ts) {
            match load_file(&file.path, file.timestamp) {
                Ok(snapshot) => {
                    window.snapshots.insert(file.timestamp, snapshot);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "skipping snapshot");
                    window.skipped += 1;
                }
            }
        }
        Ok(window)
    }

    /// Like `load_since`, but keeps every producer field untouched.
    #[instrument(skip(self), fields(repo = "snapshots", operation = "load_raw_since"))]
    pub fn load_raw_since(&self, start_ts: i64) -> Result<RawWindow, ProcessorError> {
        let listing = files::list(&self.data_dir, FileKind::Snapshot)?;
        let mut window = RawWindow {
            skipped: listing.malformed,
            ..Default::default()
        };
        for file in listing.files.into_iter().filter(|f| f.timestamp >= start_ts) {
            match load_raw_file(&file.path) {
                Ok(body) => window.snapshots.push(body),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping snapshot");
                    window.skipped += 1;
                }
            }
        }
        Ok(window)
    }

    /// Newest snapshot that is a JSON object, verbatim.
    #[instrument(skip(self), fields(repo = "snapshots", operation = "latest_raw"))]
    pub fn latest_raw(&self) -> Result<Option<Value>, ProcessorError> {
        let listing = files::list(&self.data_dir, FileKind::Snapshot)?;
        for file in listing.files.iter().rev() {
            match load_raw_file(&file.path) {
                Ok(body) => return Ok(Some(body)),
                Err(e) => tracing::debug!(error = %e, "skipping snapshot"),
            }
        }
        Ok(None)
    }

    /// Last `limit` entries of the `alerts.jsonl` log, newest first. Lines that are not
    /// JSON are skipped; a missing log is empty.
    #[instrument(skip(self), fields(repo = "snapshots", operation = "recent_alerts"))]
    pub fn recent_alerts(&self, limit: usize) -> io::Result<Vec<Value>> {
        let text = match fs::read_to_string(self.data_dir.join(ALERTS_LOG)) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let alerts: Vec<Value> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect();
        Ok(alerts.into_iter().rev().take(limit).collect())
    }

    /// Snapshot files newer than `watermark`, ascending, without reading them.
    pub fn list_after(&self, watermark: i64) -> io::Result<Vec<files::TimestampedFile>> {
        let listing = files::list(&self.data_dir, FileKind::Snapshot)?;
        Ok(listing
            .files
            .into_iter()
            .filter(|f| f.timestamp > watermark)
            .collect())
    }
}

/// Reads one snapshot. A missing body timestamp is filled from the file name.
pub fn load_file(path: &Path, name_ts: i64) -> Result<Snapshot, ProcessorError> {
    let bytes = fs::read(path).map_err(|e| ProcessorError::malformed(path, e))?;
    let mut snapshot: Snapshot =
        serde_json::from_slice(&bytes).map_err(|e| ProcessorError::malformed(path, e))?;
    if snapshot.timestamp.is_none_or(|ts| ts == 0) {
        snapshot.timestamp = Some(name_ts);
    }
    Ok(snapshot)
}

/// Reads one snapshot body without interpreting it. Anything but a JSON object is malformed.
pub fn load_raw_file(path: &Path) -> Result<Value, ProcessorError> {
    let bytes = fs::read(path).map_err(|e| ProcessorError::malformed(path, e))?;
    let body: Value =
        serde_json::from_slice(&bytes).map_err(|e| ProcessorError::malformed(path, e))?;
    if !body.is_object() {
        return Err(ProcessorError::malformed(path, "not a JSON object"));
    }
    Ok(body)
}

/// Runs blocking store work off the runtime, bounded by `io_timeout`.
pub async fn run_blocking<T, F>(io_timeout: Duration, f: F) -> Result<T, ProcessorError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ProcessorError> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(f);
    match tokio::time::timeout(io_timeout, task).await {
        Err(_) => Err(ProcessorError::Timeout(io_timeout)),
        Ok(Err(join)) => Err(ProcessorError::Io(io::Error::other(join))),
        Ok(Ok(result)) => result,
    }
}
