// Forwarding watermark: highest snapshot timestamp already forwarded, persisted as text.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::files;

pub struct Watermark {
    path: PathBuf,
}

impl Watermark {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored value; 0 when the file is missing or garbled.
    pub fn load(&self) -> i64 {
        match fs::read_to_string(&self.path) {
            Ok(s) => s.trim().parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, file = %self.path.display(), "garbled watermark, starting from 0");
                0
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => {
                tracing::warn!(error = %e, file = %self.path.display(), "unreadable watermark, starting from 0");
                0
            }
        }
    }

    pub fn store(&self, timestamp: i64) -> io::Result<()> {
        files::write_atomic(&self.path, timestamp.to_string().as_bytes())
    }
}
