// Retention sweep over snapshot, summary and report files

mod common;

use std::time::Duration;

use common::touch;
use sysreport::retention::RetentionSweeper;

const NOW: i64 = 1_700_000_000;
const DAY: i64 = 86_400;

struct Dirs {
    _root: tempfile::TempDir,
    data: std::path::PathBuf,
    reports: std::path::PathBuf,
}

fn dirs() -> Dirs {
    let root = tempfile::TempDir::new().unwrap();
    let data = root.path().join("data");
    let reports = root.path().join("reports");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::create_dir_all(&reports).unwrap();
    Dirs {
        _root: root,
        data,
        reports,
    }
}

fn names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_zero_max_age_deletes_every_past_file() {
    let d = dirs();
    touch(&d.data, &format!("metrics_{}.json", NOW - 10));
    touch(&d.data, &format!("metrics_{}.json", NOW - 3 * DAY));
    touch(&d.data, &format!("summary_{}.json", NOW - 60));
    touch(&d.reports, &format!("report_{}.html", NOW - 60));

    let sweeper = RetentionSweeper::new(&d.data, &d.reports);
    assert_eq!(sweeper.sweep_at(NOW, Duration::ZERO), 4);
    assert!(names(&d.data).is_empty());
    assert!(names(&d.reports).is_empty());
}

#[test]
fn test_large_max_age_deletes_nothing() {
    let d = dirs();
    touch(&d.data, &format!("metrics_{}.json", NOW - 3 * DAY));
    touch(&d.reports, &format!("report_{}.html", NOW - 3 * DAY));

    let sweeper = RetentionSweeper::new(&d.data, &d.reports);
    assert_eq!(sweeper.sweep_at(NOW, Duration::from_secs(30 * DAY as u64)), 0);
    assert_eq!(names(&d.data).len(), 1);
    assert_eq!(names(&d.reports).len(), 1);
}

#[test]
fn test_cutoff_is_strict() {
    let d = dirs();
    let max_age = Duration::from_secs(7 * DAY as u64);
    touch(&d.data, &format!("metrics_{}.json", NOW - 7 * DAY));
    touch(&d.data, &format!("metrics_{}.json", NOW - 7 * DAY - 1));

    let sweeper = RetentionSweeper::new(&d.data, &d.reports);
    assert_eq!(sweeper.sweep_at(NOW, max_age), 1);
    assert_eq!(names(&d.data), vec![format!("metrics_{}.json", NOW - 7 * DAY)]);
}

#[test]
fn test_unparseable_and_latest_files_untouched() {
    let d = dirs();
    touch(&d.data, "metrics_abc.json");
    touch(&d.data, "metrics_.json");
    touch(&d.data, "latest_summary.json");
    touch(&d.data, "notes.txt");
    touch(&d.data, ".tmp-123.part");
    touch(&d.reports, "latest_report.html");
    touch(&d.reports, "report_12x.html");

    let sweeper = RetentionSweeper::new(&d.data, &d.reports);
    assert_eq!(sweeper.sweep_at(NOW, Duration::ZERO), 0);
    assert_eq!(names(&d.data).len(), 5);
    assert_eq!(names(&d.reports).len(), 2);
}

#[test]
fn test_sweep_is_idempotent() {
    let d = dirs();
    touch(&d.data, &format!("metrics_{}.json", NOW - 2 * DAY));
    touch(&d.data, &format!("metrics_{}.json", NOW - 10));

    let sweeper = RetentionSweeper::new(&d.data, &d.reports);
    let max_age = Duration::from_secs(DAY as u64);
    assert_eq!(sweeper.sweep_at(NOW, max_age), 1);
    assert_eq!(sweeper.sweep_at(NOW, max_age), 0);
    assert_eq!(names(&d.data).len(), 1);
}

#[test]
fn test_missing_directories_are_not_an_error() {
    let root = tempfile::TempDir::new().unwrap();
    let sweeper = RetentionSweeper::new(root.path().join("gone"), root.path().join("also-gone"));
    assert_eq!(sweeper.sweep_at(NOW, Duration::ZERO), 0);
}

#[test]
fn test_sweep_uses_wall_clock() {
    let d = dirs();
    // 2001-09-09; long past for any real clock.
    touch(&d.data, "metrics_1000000000.json");
    let sweeper = RetentionSweeper::new(&d.data, &d.reports);
    assert_eq!(sweeper.sweep(Duration::from_secs(DAY as u64)), 1);
}
