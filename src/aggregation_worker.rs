// Background worker: every interval_secs, summarize the trailing window and publish the
// summary and its HTML report. Retention sweeps run on their own schedule (cron expression
// or fixed interval) in the same task.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

use crate::aggregation;
use crate::artifact_repo::ArtifactRepo;
use crate::error::ProcessorError;
use crate::models::Summary;
use crate::report;
use crate::retention::RetentionSweeper;
use crate::snapshot_repo::{self, SnapshotRepo};

/// Config for the aggregation worker.
#[derive(Debug, Clone)]
pub struct AggregationWorkerConfig {
    pub interval_secs: u64,
    pub window: Duration,
    pub keep_history: bool,
    pub io_timeout: Duration,
}

/// Config for the retention scheduler; None disables sweeping.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub max_age: Duration,
    /// Optional cron expression. Uses local time.
    pub schedule: Option<String>,
    /// Sweep every N seconds when schedule is not set.
    pub interval_secs: u64,
}

/// Repos shared by the worker and the CLI one-shot commands.
pub struct WorkerDeps {
    pub snapshots: Arc<SnapshotRepo>,
    pub artifacts: Arc<ArtifactRepo>,
    pub sweeper: Arc<RetentionSweeper>,
}

/// What one tick produced.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub sample_count: usize,
    pub skipped: usize,
    pub summary_path: PathBuf,
    pub report_path: PathBuf,
}

/// Spawns the worker. Aggregation is skipped entirely when `config` is None.
pub fn spawn(
    deps: WorkerDeps,
    config: Option<AggregationWorkerConfig>,
    sweep: Option<SweepConfig>,
    shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(deps, config, sweep, shutdown).await;
    })
}

#[instrument(skip_all)]
async fn run(
    deps: WorkerDeps,
    config: Option<AggregationWorkerConfig>,
    sweep: Option<SweepConfig>,
    mut shutdown: watch::Receiver<bool>,
) {
    // One hour placeholder tick when aggregation is disabled; the branch is never taken then.
    let period = config
        .as_ref()
        .map_or(Duration::from_secs(3600), |c| Duration::from_secs(c.interval_secs));
    let mut agg_interval = tokio::time::interval(period);
    agg_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let (sweep_tx, mut sweep_rx) = mpsc::channel::<()>(1);
    let max_age = sweep.as_ref().map(|s| s.max_age);
    let scheduler = sweep.map(|s| tokio::spawn(sweep_scheduler(s, sweep_tx)));

    loop {
        tokio::select! {
            _ = agg_interval.tick(), if config.is_some() => {
                let Some(cfg) = config.as_ref() else { continue };
                match run_one_tick(&deps, cfg, chrono::Local::now()).await {
                    Ok(o) => info!(
                        samples = o.sample_count,
                        skipped = o.skipped,
                        summary = %o.summary_path.display(),
                        report = %o.report_path.display(),
                        "summary and report published"
                    ),
                    Err(e @ ProcessorError::NoDataAvailable { .. }) => info!("{}", e),
                    Err(e) => warn!(error = %e, retryable = e.is_retryable(), "aggregation tick failed"),
                }
            }
            Some(()) = sweep_rx.recv() => {
                if let Some(max_age) = max_age {
                    let sweeper = deps.sweeper.clone();
                    match tokio::task::spawn_blocking(move || sweeper.sweep(max_age)).await {
                        Ok(deleted) => debug!(deleted, "scheduled sweep finished"),
                        Err(e) => warn!(error = %e, "retention sweep task failed"),
                    }
                }
            }
            _ = shutdown.changed() => {
                debug!("Aggregation worker shutting down");
                break;
            }
        }
    }
    if let Some(handle) = scheduler {
        handle.abort();
    }
}

/// Sends a message on `tx` at each sweep time (cron or fixed interval). Uses local time for cron.
async fn sweep_scheduler(config: SweepConfig, tx: mpsc::Sender<()>) {
    if let Some(ref cron_str) = config.schedule {
        let Ok(schedule) = cron::Schedule::from_str(cron_str) else {
            warn!(cron = %cron_str, "invalid sweep_schedule; retention will not run");
            return;
        };
        loop {
            let now = chrono::Local::now();
            if let Some(next) = schedule.after(&now).next() {
                let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
                tokio::time::sleep(delay).await;
                if tx.send(()).await.is_err() {
                    break;
                }
            } else {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
    } else {
        let interval = Duration::from_secs(config.interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            if tx.send(()).await.is_err() {
                break;
            }
        }
    }
}

/// Runs one pass: load window, summarize, persist summary, render and persist report.
/// Used by the worker loop and by the CLI `summary` command.
/// On `NoDataAvailable` nothing is written and the previous artifacts stay in place.
pub async fn run_one_tick(
    deps: &WorkerDeps,
    config: &AggregationWorkerConfig,
    now: chrono::DateTime<chrono::Local>,
) -> Result<TickOutcome, ProcessorError> {
    let (summary, skipped) = summarize_window(deps, config, now).await?;
    let html = report::render_report(&summary);

    let artifacts = deps.artifacts.clone();
    let keep_history = config.keep_history;
    let sample_count = summary.sample_count;
    let (summary_path, report_path) = snapshot_repo::run_blocking(config.io_timeout, move || {
        let summary_path = artifacts.save_summary(&summary, keep_history)?;
        let report_path = artifacts.save_report(&html, summary.generated_at.timestamp())?;
        Ok((summary_path, report_path))
    })
    .await?;

    Ok(TickOutcome {
        sample_count,
        skipped,
        summary_path,
        report_path,
    })
}

/// Renders the window into `report_<ts>.html` and `latest_report.html` only; summary
/// files are left alone. Backs the CLI `report` command.
pub async fn publish_report(
    deps: &WorkerDeps,
    config: &AggregationWorkerConfig,
    now: chrono::DateTime<chrono::Local>,
) -> Result<PathBuf, ProcessorError> {
    let (summary, _) = summarize_window(deps, config, now).await?;
    let html = report::render_report(&summary);
    let artifacts = deps.artifacts.clone();
    let generated_ts = summary.generated_at.timestamp();
    snapshot_repo::run_blocking(config.io_timeout, move || {
        Ok(artifacts.save_report(&html, generated_ts)?)
    })
    .await
}

/// Loads the window ending at `now` and builds its summary; also returns the skip count.
async fn summarize_window(
    deps: &WorkerDeps,
    config: &AggregationWorkerConfig,
    now: chrono::DateTime<chrono::Local>,
) -> Result<(Summary, usize), ProcessorError> {
    let reference = now.timestamp();
    let start = aggregation::window_start(reference, config.window);

    let repo = deps.snapshots.clone();
    let loaded =
        snapshot_repo::run_blocking(config.io_timeout, move || repo.load_since(start)).await?;
    if loaded.skipped > 0 {
        warn!(skipped = loaded.skipped, "malformed snapshot files skipped");
    }

    let summary = aggregation::build_summary(loaded.snapshots, reference, config.window, now)?;
    Ok((summary, loaded.skipped))
}
