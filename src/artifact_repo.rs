// Derived artifacts: summaries (data dir) and HTML reports (reports dir).
// "latest" files are replaced atomically, last writer wins.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::instrument;

use crate::files::{self, FileKind, LATEST_REPORT, LATEST_SUMMARY};
use crate::models::Summary;

/// Entry of `GET /api/reports/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub filename: String,
    pub timestamp: i64,
    pub datetime: String,
    pub size: u64,
}

pub struct ArtifactRepo {
    data_dir: PathBuf,
    reports_dir: PathBuf,
}

impl ArtifactRepo {
    pub fn new(data_dir: impl Into<PathBuf>, reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            reports_dir: reports_dir.into(),
        }
    }

    /// Like `new`, creating both directories if missing.
    pub fn open(data_dir: impl Into<PathBuf>, reports_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let repo = Self::new(data_dir, reports_dir);
        fs::create_dir_all(&repo.data_dir)?;
        fs::create_dir_all(&repo.reports_dir)?;
        Ok(repo)
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Writes `latest_summary.json` and, with `keep_history`, `summary_<ts>.json`.
    /// Returns the historical path when written, else the latest path.
    #[instrument(skip(self, summary), fields(repo = "artifacts", operation = "save_summary"))]
    pub fn save_summary(&self, summary: &Summary, keep_history: bool) -> io::Result<PathBuf> {
        let body = serde_json::to_vec_pretty(summary).map_err(io::Error::other)?;
        let latest = self.data_dir.join(LATEST_SUMMARY);
        let mut written = latest.clone();
        if keep_history {
            let historical = self
                .data_dir
                .join(FileKind::Summary.file_name(summary.generated_at.timestamp()));
            files::write_atomic(&historical, &body)?;
            written = historical;
        }
        files::write_atomic(&latest, &body)?;
        Ok(written)
    }

    /// Raw `latest_summary.json`, None when no summary was produced yet.
    pub fn latest_summary_json(&self) -> io::Result<Option<String>> {
        read_optional(&self.data_dir.join(LATEST_SUMMARY))
    }

    pub fn latest_summary(&self) -> io::Result<Option<Summary>> {
        self.latest_summary_json()?
            .map(|s| serde_json::from_str(&s).map_err(io::Error::other))
            .transpose()
    }

    /// Writes `report_<ts>.html` and `latest_report.html`; returns the historical path.
    #[instrument(skip(self, html), fields(repo = "artifacts", operation = "save_report"))]
    pub fn save_report(&self, html: &str, generated_ts: i64) -> io::Result<PathBuf> {
        let historical = self.reports_dir.join(FileKind::Report.file_name(generated_ts));
        files::write_atomic(&historical, html.as_bytes())?;
        files::write_atomic(&self.reports_dir.join(LATEST_REPORT), html.as_bytes())?;
        Ok(historical)
    }

    pub fn latest_report(&self) -> io::Result<Option<String>> {
        read_optional(&self.reports_dir.join(LATEST_REPORT))
    }

    /// Historical reports, newest first. Files that vanish while listing are left out.
    pub fn list_reports(&self) -> io::Result<Vec<ReportEntry>> {
        let listing = files::list(&self.reports_dir, FileKind::Report)?;
        let mut out = Vec::with_capacity(listing.files.len());
        for file in listing.files.into_iter().rev() {
            let Ok(meta) = fs::metadata(&file.path) else {
                continue;
            };
            let datetime = chrono::DateTime::from_timestamp(file.timestamp, 0)
                .map(|dt| dt.with_timezone(&chrono::Local).to_rfc3339())
                .unwrap_or_default();
            out.push(ReportEntry {
                filename: FileKind::Report.file_name(file.timestamp),
                timestamp: file.timestamp,
                datetime,
                size: meta.len(),
            });
        }
        Ok(out)
    }
}

fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
