// Time-series forwarder: replays raw snapshot files newer than the watermark into
// InfluxDB. Independent of the aggregation pipeline; both only read the snapshot files.

pub mod line_protocol;
mod watermark;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::config::ForwarderConfig;
use crate::snapshot_repo::{self, SnapshotRepo};

pub use watermark::Watermark;

/// Minimal InfluxDB 1.x HTTP client.
pub struct InfluxClient {
    http: reqwest::Client,
    base_url: String,
    database: String,
}

impl InfluxClient {
    pub fn new(config: &ForwarderConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
        })
    }

    /// `CREATE DATABASE` is idempotent on the server side.
    pub async fn create_database(&self) -> anyhow::Result<()> {
        let query = format!("CREATE DATABASE \"{}\"", self.database.replace('"', "\\\""));
        let response = self
            .http
            .post(format!("{}/query", self.base_url))
            .form(&[("q", query)])
            .send()
            .await
            .context("create database request")?;
        let status = response.status();
        anyhow::ensure!(status.is_success(), "create database failed: {}", status);
        Ok(())
    }

    /// Writes newline-separated line protocol with second precision.
    pub async fn write(&self, body: String) -> anyhow::Result<()> {
        let response = self
            .http
            .post(format!("{}/write", self.base_url))
            .query(&[("db", self.database.as_str()), ("precision", "s")])
            .body(body)
            .send()
            .await
            .context("write request")?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("write failed ({}): {}", status, text);
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ForwardOutcome {
    pub forwarded: usize,
    /// Unreadable or unparseable files; the watermark moves past them.
    pub skipped: usize,
    pub watermark: i64,
}

pub struct Forwarder {
    repo: Arc<SnapshotRepo>,
    client: InfluxClient,
    watermark: Watermark,
    io_timeout: Duration,
}

impl Forwarder {
    pub fn new(
        repo: Arc<SnapshotRepo>,
        client: InfluxClient,
        watermark: Watermark,
        io_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            client,
            watermark,
            io_timeout,
        }
    }

    /// Forwards every pending snapshot in timestamp order. A failed write stops the
    /// pass with the watermark left on the last forwarded file, so it is retried next time.
    #[instrument(skip(self), fields(operation = "forward_pass"))]
    pub async fn run_once(&self) -> anyhow::Result<ForwardOutcome> {
        let mut outcome = ForwardOutcome {
            watermark: self.watermark.load(),
            ..Default::default()
        };
        let repo = self.repo.clone();
        let after = outcome.watermark;
        let pending = snapshot_repo::run_blocking(self.io_timeout, move || {
            repo.list_after(after).map_err(Into::into)
        })
        .await?;

        for file in pending {
            let path = file.path.clone();
            let loaded = snapshot_repo::run_blocking(self.io_timeout, move || {
                snapshot_repo::load_file(&path, file.timestamp)
            })
            .await;
            match loaded {
                Ok(snapshot) => {
                    let points = line_protocol::snapshot_points(&snapshot);
                    if !points.is_empty() {
                        self.client
                            .write(line_protocol::encode(&points))
                            .await
                            .with_context(|| format!("forwarding {}", file.path.display()))?;
                    }
                    debug!(file = %file.path.display(), points = points.len(), "forwarded");
                    outcome.forwarded += 1;
                }
                Err(e) if e.is_retryable() => return Err(e.into()),
                Err(e) => {
                    warn!(error = %e, "skipping unforwardable snapshot");
                    outcome.skipped += 1;
                }
            }
            self.watermark
                .store(file.timestamp)
                .context("persisting watermark")?;
            outcome.watermark = file.timestamp;
        }
        Ok(outcome)
    }
}

/// Spawns the polling loop. Stops when `shutdown` flips to true.
pub fn spawn(
    forwarder: Forwarder,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = forwarder.client.create_database().await {
            warn!(error = %e, "forwarder: create database failed");
        }
        let mut tick = tokio::time::interval(poll_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match forwarder.run_once().await {
                        Ok(o) if o.forwarded + o.skipped > 0 => info!(
                            forwarded = o.forwarded,
                            skipped = o.skipped,
                            watermark = o.watermark,
                            "forwarder pass"
                        ),
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "forwarder pass failed"),
                    }
                }
                _ = shutdown.changed() => {
                    debug!("Forwarder shutting down");
                    break;
                }
            }
        }
    })
}
