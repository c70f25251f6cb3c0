// On-disk naming convention (`<prefix>_<unix_ts>.<ext>`) and atomic replacement.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Timestamped file families produced and consumed by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `metrics_<ts>.json`, written by the external producer.
    Snapshot,
    /// `summary_<ts>.json`, historical summaries.
    Summary,
    /// `report_<ts>.html`, historical reports.
    Report,
}

pub const LATEST_SUMMARY: &str = "latest_summary.json";
pub const LATEST_REPORT: &str = "latest_report.html";
/// Alert log appended by the producer, one JSON object per line.
pub const ALERTS_LOG: &str = "alerts.jsonl";

impl FileKind {
    pub fn prefix(self) -> &'static str {
        match self {
            FileKind::Snapshot => "metrics_",
            FileKind::Summary => "summary_",
            FileKind::Report => "report_",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Snapshot | FileKind::Summary => ".json",
            FileKind::Report => ".html",
        }
    }

    pub fn file_name(self, timestamp: i64) -> String {
        format!("{}{}{}", self.prefix(), timestamp, self.extension())
    }

    /// Timestamp encoded in `name`, or None when the name is not of this kind
    /// or the timestamp part is not a plain integer.
    pub fn parse_timestamp(self, name: &str) -> Option<i64> {
        let digits = name
            .strip_prefix(self.prefix())?
            .strip_suffix(self.extension())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// One directory listing entry whose name matched a [`FileKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampedFile {
    pub timestamp: i64,
    pub path: PathBuf,
}

/// Result of listing a directory for one kind; `malformed` counts names with the
/// right prefix/extension but an unparseable timestamp.
#[derive(Debug, Default)]
pub struct Listing {
    pub files: Vec<TimestampedFile>,
    pub malformed: usize,
}

/// Lists files of `kind` in `dir`, ascending by timestamp. Fails only when the
/// directory itself cannot be read; unreadable entries are skipped.
pub fn list(dir: &Path, kind: FileKind) -> io::Result<Listing> {
    let mut listing = Listing::default();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(error = %e, dir = %dir.display(), "skipping unreadable dir entry");
                continue;
            }
        };
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !(name.starts_with(kind.prefix()) && name.ends_with(kind.extension())) {
            continue;
        }
        match kind.parse_timestamp(name) {
            Some(timestamp) => listing.files.push(TimestampedFile {
                timestamp,
                path: entry.path(),
            }),
            None => {
                tracing::debug!(file = name, "unparseable timestamp in file name");
                listing.malformed += 1;
            }
        }
    }
    listing.files.sort_by_key(|f| f.timestamp);
    Ok(listing)
}

/// Writes `contents` to a temp file in the destination directory, then renames it over `path`.
/// Readers see either the old file or the complete new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-")
        .suffix(".part")
        .tempfile_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_names() {
        assert_eq!(
            FileKind::Snapshot.parse_timestamp("metrics_1700000000.json"),
            Some(1_700_000_000)
        );
        assert_eq!(
            FileKind::Report.parse_timestamp("report_42.html"),
            Some(42)
        );
    }

    #[test]
    fn rejects_malformed_names() {
        assert_eq!(FileKind::Snapshot.parse_timestamp("metrics_.json"), None);
        assert_eq!(FileKind::Snapshot.parse_timestamp("metrics_12a.json"), None);
        assert_eq!(FileKind::Snapshot.parse_timestamp("metrics_-5.json"), None);
        assert_eq!(FileKind::Snapshot.parse_timestamp("metrics_12.json.part"), None);
        assert_eq!(FileKind::Summary.parse_timestamp("latest_summary.json"), None);
        assert_eq!(FileKind::Report.parse_timestamp("report_12.json"), None);
    }

    #[test]
    fn file_name_matches_parse() {
        let name = FileKind::Summary.file_name(1234);
        assert_eq!(name, "summary_1234.json");
        assert_eq!(FileKind::Summary.parse_timestamp(&name), Some(1234));
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(LATEST_SUMMARY);
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
