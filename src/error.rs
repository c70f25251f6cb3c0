// Error taxonomy for the snapshot store and the aggregation engine.
// Application glue (config, workers, CLI) stays on anyhow.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    /// The window selected zero usable snapshots. Non-fatal; callers skip the tick.
    #[error("no snapshots available in the last {window_secs}s")]
    NoDataAvailable { window_secs: u64 },

    /// A snapshot file failed to read or parse. Skipped by the store, never propagated out of a window load.
    #[error("malformed record {}: {reason}", path.display())]
    MalformedRecord { path: PathBuf, reason: String },

    #[error("snapshot store I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot store did not answer within {0:?}")]
    Timeout(Duration),
}

impl ProcessorError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Store unreachable or slow; the next scheduler tick may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Timeout(_))
    }
}
