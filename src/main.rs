use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sysreport::aggregation_worker::{
    self, AggregationWorkerConfig, SweepConfig, TickOutcome, WorkerDeps,
};
use sysreport::artifact_repo::ArtifactRepo;
use sysreport::config::AppConfig;
use sysreport::error::ProcessorError;
use sysreport::forwarder::{self, Forwarder, InfluxClient, Watermark};
use sysreport::retention::RetentionSweeper;
use sysreport::routes;
use sysreport::snapshot_repo::SnapshotRepo;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[derive(Parser)]
#[command(name = "sysreport")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Summarize system metric snapshots into JSON summaries and HTML reports")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, env = "CONFIG_FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the aggregation worker, retention sweeps, forwarder and query API (default)
    Serve,
    /// Build and persist one summary, print it as JSON
    Summary {
        /// Window length in hours (default: aggregation.window_hours)
        #[arg(long)]
        hours: Option<u32>,
    },
    /// Render and persist one HTML report (summary files untouched)
    Report {
        /// Window length in hours (default: aggregation.window_hours)
        #[arg(long)]
        hours: Option<u32>,
    },
    /// Delete snapshot, summary and report files older than N days
    Cleanup {
        /// Days to keep (default: retention.max_age_days)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Run one forwarding pass to the time-series store
    Forward,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();
    let app_config = AppConfig::load_from_path(&cli.config)?;

    let snapshots = Arc::new(SnapshotRepo::open(&app_config.storage.data_dir)?);
    let artifacts = Arc::new(ArtifactRepo::open(
        &app_config.storage.data_dir,
        &app_config.storage.reports_dir,
    )?);
    let sweeper = Arc::new(RetentionSweeper::new(
        &app_config.storage.data_dir,
        &app_config.storage.reports_dir,
    ));
    let deps = WorkerDeps {
        snapshots,
        artifacts,
        sweeper,
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(app_config, deps).await,
        Command::Summary { hours } => {
            let config = worker_config(&app_config, hours);
            if let Some(outcome) = one_shot(&deps, &config).await? {
                tracing::info!(summary = %outcome.summary_path.display(), "summary saved");
                if let Some(summary) = deps.artifacts.latest_summary()? {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
            }
            Ok(())
        }
        Command::Report { hours } => {
            let config = worker_config(&app_config, hours);
            match aggregation_worker::publish_report(&deps, &config, chrono::Local::now()).await {
                Ok(path) => println!("Report saved: {}", path.display()),
                Err(e @ ProcessorError::NoDataAvailable { .. }) => tracing::warn!("{}", e),
                Err(e) => return Err(e.into()),
            }
            Ok(())
        }
        Command::Cleanup { days } => {
            let days = days.unwrap_or(app_config.retention.max_age_days);
            let deleted = deps
                .sweeper
                .sweep(Duration::from_secs(u64::from(days) * 86_400));
            println!("Cleaned up {deleted} old files");
            Ok(())
        }
        Command::Forward => {
            let forwarder = build_forwarder(&app_config, deps.snapshots.clone())?;
            let outcome = forwarder.run_once().await?;
            println!(
                "Forwarded {} snapshots ({} skipped), watermark {}",
                outcome.forwarded, outcome.skipped, outcome.watermark
            );
            Ok(())
        }
    }
}

/// One aggregation tick; an empty window is reported and yields None.
async fn one_shot(
    deps: &WorkerDeps,
    config: &AggregationWorkerConfig,
) -> Result<Option<TickOutcome>> {
    match aggregation_worker::run_one_tick(deps, config, chrono::Local::now()).await {
        Ok(outcome) => Ok(Some(outcome)),
        Err(e @ ProcessorError::NoDataAvailable { .. }) => {
            tracing::warn!("{}", e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn worker_config(app_config: &AppConfig, hours: Option<u32>) -> AggregationWorkerConfig {
    let window = match hours {
        Some(h) => Duration::from_secs(u64::from(h) * 3600),
        None => app_config.aggregation.window(),
    };
    AggregationWorkerConfig {
        interval_secs: app_config.aggregation.interval_secs,
        window,
        keep_history: app_config.aggregation.keep_history,
        io_timeout: app_config.storage.io_timeout(),
    }
}

fn build_forwarder(app_config: &AppConfig, snapshots: Arc<SnapshotRepo>) -> Result<Forwarder> {
    let client = InfluxClient::new(&app_config.forwarder).context("forwarder client")?;
    let watermark = Watermark::new(
        app_config
            .forwarder
            .watermark_path(&app_config.storage.data_dir),
    );
    Ok(Forwarder::new(
        snapshots,
        client,
        watermark,
        app_config.storage.io_timeout(),
    ))
}

async fn serve(app_config: AppConfig, deps: WorkerDeps) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let forwarder_handle = if app_config.forwarder.enabled {
        let forwarder = build_forwarder(&app_config, deps.snapshots.clone())?;
        Some(forwarder::spawn(
            forwarder,
            Duration::from_secs(app_config.forwarder.poll_interval_secs),
            shutdown_rx.clone(),
        ))
    } else {
        None
    };

    let router = app_config.server.enabled.then(|| {
        routes::app(
            deps.snapshots.clone(),
            deps.artifacts.clone(),
            app_config.storage.io_timeout(),
        )
    });

    let aggregation = app_config
        .aggregation
        .enabled
        .then(|| worker_config(&app_config, None));
    let sweep = app_config.retention.enabled.then(|| SweepConfig {
        max_age: app_config.retention.max_age(),
        schedule: app_config.retention.sweep_schedule.clone(),
        interval_secs: app_config.retention.sweep_interval_secs,
    });
    let worker_handle = aggregation_worker::spawn(deps, aggregation, sweep, shutdown_rx.clone());

    let mut server_rx = shutdown_rx.clone();
    let server = async move {
        match router {
            Some(app) => {
                let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
                let listener = tokio::net::TcpListener::bind(&addr).await?;
                tracing::info!("Listening on http://{}", addr);
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = server_rx.changed().await;
                    })
                    .await?;
            }
            None => {
                let _ = server_rx.changed().await;
            }
        }
        anyhow::Ok(())
    };
    let server = tokio::spawn(server);

    shutdown_signal().await;
    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(true);

    let _ = worker_handle.await;
    if let Some(handle) = forwarder_handle {
        let _ = handle.await;
    }
    server.await??;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
