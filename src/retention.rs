// Retention sweep: deletes timestamped snapshot, summary and report files older than a cutoff.
// Names without a parseable timestamp are never touched. Best effort: listing or deletion
// failures are logged and skipped, the sweep only reports how many files it removed.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::files::{self, FileKind};

pub struct RetentionSweeper {
    data_dir: PathBuf,
    reports_dir: PathBuf,
}

impl RetentionSweeper {
    pub fn new(data_dir: impl Into<PathBuf>, reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            reports_dir: reports_dir.into(),
        }
    }

    /// Sweeps relative to the current wall clock.
    pub fn sweep(&self, max_age: Duration) -> usize {
        self.sweep_at(chrono::Utc::now().timestamp(), max_age)
    }

    /// Deletes every managed file whose name timestamp is `< now - max_age`.
    /// Idempotent; returns the number of files deleted by this call.
    #[instrument(skip(self), fields(operation = "retention_sweep"))]
    pub fn sweep_at(&self, now: i64, max_age: Duration) -> usize {
        let cutoff = crate::aggregation::window_start(now, max_age);
        let targets = [
            (&self.data_dir, FileKind::Snapshot),
            (&self.data_dir, FileKind::Summary),
            (&self.reports_dir, FileKind::Report),
        ];

        let mut deleted = 0;
        for (dir, kind) in targets {
            let listing = match files::list(dir, kind) {
                Ok(l) => l,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!(error = %e, dir = %dir.display(), "retention: cannot list directory");
                    continue;
                }
            };
            for file in listing.files.iter().filter(|f| f.timestamp < cutoff) {
                match fs::remove_file(&file.path) {
                    Ok(()) => deleted += 1,
                    // Already gone (concurrent sweep or producer cleanup).
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        warn!(error = %e, file = %file.path.display(), "retention: delete failed")
                    }
                }
            }
            debug!(kind = ?kind, malformed_names = listing.malformed, "retention: directory swept");
        }

        info!(deleted, cutoff, "retention sweep complete");
        deleted
    }
}
