// Aggregation tick and worker lifecycle

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, TimeZone};
use common::*;
use sysreport::aggregation_worker::{
    self, AggregationWorkerConfig, SweepConfig, WorkerDeps, publish_report, run_one_tick,
};
use sysreport::artifact_repo::ArtifactRepo;
use sysreport::error::ProcessorError;
use sysreport::retention::RetentionSweeper;
use sysreport::snapshot_repo::SnapshotRepo;

const NOW: i64 = 1_700_000_000;

struct Fixture {
    root: tempfile::TempDir,
    deps: WorkerDeps,
}

impl Fixture {
    fn new() -> Self {
        let root = tempfile::TempDir::new().unwrap();
        let data = root.path().join("data");
        let reports = root.path().join("reports");
        let deps = WorkerDeps {
            snapshots: Arc::new(SnapshotRepo::open(&data).unwrap()),
            artifacts: Arc::new(ArtifactRepo::open(&data, &reports).unwrap()),
            sweeper: Arc::new(RetentionSweeper::new(&data, &reports)),
        };
        Self { root, deps }
    }

    fn data(&self) -> std::path::PathBuf {
        self.root.path().join("data")
    }

    fn reports(&self) -> std::path::PathBuf {
        self.root.path().join("reports")
    }
}

fn config(keep_history: bool) -> AggregationWorkerConfig {
    AggregationWorkerConfig {
        interval_secs: 300,
        window: Duration::from_secs(3600),
        keep_history,
        io_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_tick_publishes_summary_and_report() {
    let fx = Fixture::new();
    write_snapshot(&fx.data(), NOW - 7200, &producer_json(NOW - 7200, "9.0"));
    write_snapshot(&fx.data(), NOW - 600, &producer_json(NOW - 600, "1.0"));
    write_snapshot(&fx.data(), NOW - 300, &producer_json(NOW - 300, "3.0"));
    std::fs::write(fx.data().join("metrics_broken.json"), b"{}").unwrap();

    let now = Local.timestamp_opt(NOW, 0).unwrap();
    let outcome = run_one_tick(&fx.deps, &config(true), now).await.unwrap();
    assert_eq!(outcome.sample_count, 2);
    assert_eq!(outcome.skipped, 1);
    assert!(outcome.summary_path.ends_with(format!("summary_{NOW}.json")));
    assert!(outcome.report_path.ends_with(format!("report_{NOW}.html")));

    let summary = fx.deps.artifacts.latest_summary().unwrap().unwrap();
    assert_eq!(summary.sample_count, 2);
    assert_eq!(summary.cpu_stats.load_1min_avg, Some(2.0));
    assert_eq!(summary.cpu_stats.load_1min_max, Some(3.0));
    assert!(summary.network_stats.contains_key("eth0"));

    let html = fx.deps.artifacts.latest_report().unwrap().unwrap();
    assert!(html.contains("Samples: 2"));
    assert!(fx.reports().join(format!("report_{NOW}.html")).exists());
}

#[tokio::test]
async fn test_tick_without_data_writes_nothing() {
    let fx = Fixture::new();
    write_snapshot(&fx.data(), NOW - 7200, &producer_json(NOW - 7200, "9.0"));

    let now = Local.timestamp_opt(NOW, 0).unwrap();
    let err = run_one_tick(&fx.deps, &config(true), now).await.unwrap_err();
    assert!(matches!(err, ProcessorError::NoDataAvailable { .. }));
    assert!(fx.deps.artifacts.latest_summary_json().unwrap().is_none());
    assert!(fx.deps.artifacts.latest_report().unwrap().is_none());
}

#[tokio::test]
async fn test_previous_artifacts_survive_empty_tick() {
    let fx = Fixture::new();
    write_snapshot(&fx.data(), NOW - 60, &producer_json(NOW - 60, "1.0"));
    let first = Local.timestamp_opt(NOW, 0).unwrap();
    run_one_tick(&fx.deps, &config(false), first).await.unwrap();
    let before = fx.deps.artifacts.latest_summary_json().unwrap();

    let later = Local.timestamp_opt(NOW + 86_400, 0).unwrap();
    assert!(run_one_tick(&fx.deps, &config(false), later).await.is_err());
    assert_eq!(fx.deps.artifacts.latest_summary_json().unwrap(), before);
}

#[tokio::test]
async fn test_tick_without_history_keeps_only_latest_summary() {
    let fx = Fixture::new();
    write_snapshot(&fx.data(), NOW - 60, &producer_json(NOW - 60, "1.0"));
    let now = Local.timestamp_opt(NOW, 0).unwrap();
    let outcome = run_one_tick(&fx.deps, &config(false), now).await.unwrap();
    assert!(outcome.summary_path.ends_with("latest_summary.json"));
    assert!(!fx.data().join(format!("summary_{NOW}.json")).exists());
}

#[tokio::test]
async fn test_report_only_leaves_summaries_alone() {
    let fx = Fixture::new();
    write_snapshot(&fx.data(), NOW - 60, &producer_json(NOW - 60, "1.0"));
    let now = Local.timestamp_opt(NOW, 0).unwrap();

    let path = publish_report(&fx.deps, &config(true), now).await.unwrap();
    assert!(path.ends_with(format!("report_{NOW}.html")));
    assert!(fx.deps.artifacts.latest_report().unwrap().is_some());
    assert!(fx.deps.artifacts.latest_summary_json().unwrap().is_none());
    assert!(!fx.data().join(format!("summary_{NOW}.json")).exists());
}

#[tokio::test]
async fn test_report_only_without_data_writes_nothing() {
    let fx = Fixture::new();
    let now = Local.timestamp_opt(NOW, 0).unwrap();
    let err = publish_report(&fx.deps, &config(true), now).await.unwrap_err();
    assert!(matches!(err, ProcessorError::NoDataAvailable { .. }));
    assert!(fx.deps.artifacts.latest_report().unwrap().is_none());
}

#[tokio::test]
async fn test_missing_store_is_retryable() {
    let fx = Fixture::new();
    std::fs::remove_dir_all(fx.data()).unwrap();
    let now = Local.timestamp_opt(NOW, 0).unwrap();
    let err = run_one_tick(&fx.deps, &config(true), now).await.unwrap_err();
    assert!(err.is_retryable(), "{err}");
}

#[tokio::test]
async fn test_worker_ticks_then_stops_on_shutdown() {
    let fx = Fixture::new();
    let now = chrono::Utc::now().timestamp();
    write_snapshot(&fx.data(), now - 30, &producer_json(now - 30, "1.0"));
    // Expired by the sweep's max_age below.
    touch(&fx.data(), "metrics_1000000000.json");
    let summary_file = fx.data().join("latest_summary.json");

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let handle = aggregation_worker::spawn(
        fx.deps,
        Some(config(true)),
        Some(SweepConfig {
            max_age: Duration::from_secs(86_400),
            schedule: None,
            interval_secs: 1,
        }),
        shutdown_rx,
    );

    // First tick fires immediately; the interval sweep after one second.
    let old = fx.root.path().join("data/metrics_1000000000.json");
    for _ in 0..50 {
        if summary_file.exists() && !old.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(summary_file.exists());
    assert!(!old.exists());

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker stops")
        .unwrap();
}
