use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub forwarder: ForwarderConfig,
}

/// Read-only query API.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Snapshots (`metrics_<ts>.json`) and summaries.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// HTML reports.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
    /// Upper bound on one store read pass (window load, listing).
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_aggregation_interval_secs")]
    pub interval_secs: u64,
    /// Window summarized on each tick, ending now.
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
    /// Also keep `summary_<ts>.json` next to `latest_summary.json`.
    #[serde(default = "default_true")]
    pub keep_history: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
    /// Optional cron expression (seconds field first, e.g. "0 0 3 * * *" = 03:00 daily). Local time.
    pub sweep_schedule: Option<String>,
    /// Sweep every N seconds when sweep_schedule is not set.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Time-series forwarder (InfluxDB 1.x line protocol over HTTP).
#[derive(Debug, Clone, Deserialize)]
pub struct ForwarderConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_influx_url")]
    pub url: String,
    #[serde(default = "default_influx_db")]
    pub database: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_io_timeout_secs")]
    pub timeout_secs: u64,
    /// Relative paths resolve against storage.data_dir.
    #[serde(default = "default_watermark_file")]
    pub watermark_file: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_io_timeout_secs() -> u64 {
    10
}

fn default_aggregation_interval_secs() -> u64 {
    300
}

fn default_window_hours() -> u32 {
    1
}

fn default_max_age_days() -> u32 {
    7
}

fn default_sweep_interval_secs() -> u64 {
    86_400
}

fn default_influx_url() -> String {
    "http://influxdb:8086".into()
}

fn default_influx_db() -> String {
    "system_monitoring".into()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_watermark_file() -> PathBuf {
    PathBuf::from(".last_processed_influx")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            reports_dir: default_reports_dir(),
            io_timeout_secs: default_io_timeout_secs(),
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_aggregation_interval_secs(),
            window_hours: default_window_hours(),
            keep_history: true,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_days: default_max_age_days(),
            sweep_schedule: None,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_influx_url(),
            database: default_influx_db(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_io_timeout_secs(),
            watermark_file: default_watermark_file(),
        }
    }
}

impl StorageConfig {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

impl AggregationConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(u64::from(self.window_hours) * 3600)
    }
}

impl RetentionConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(u64::from(self.max_age_days) * 86_400)
    }
}

impl ForwarderConfig {
    pub fn watermark_path(&self, data_dir: &Path) -> PathBuf {
        if self.watermark_file.is_absolute() {
            self.watermark_file.clone()
        } else {
            data_dir.join(&self.watermark_file)
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(Path::new(&path))
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.storage.data_dir.as_os_str().is_empty(),
            "storage.data_dir must be non-empty"
        );
        anyhow::ensure!(
            !self.storage.reports_dir.as_os_str().is_empty(),
            "storage.reports_dir must be non-empty"
        );
        anyhow::ensure!(
            self.storage.io_timeout_secs > 0,
            "storage.io_timeout_secs must be > 0, got {}",
            self.storage.io_timeout_secs
        );
        anyhow::ensure!(
            self.aggregation.interval_secs > 0,
            "aggregation.interval_secs must be > 0, got {}",
            self.aggregation.interval_secs
        );
        anyhow::ensure!(
            self.aggregation.window_hours > 0,
            "aggregation.window_hours must be > 0, got {}",
            self.aggregation.window_hours
        );
        anyhow::ensure!(
            self.retention.max_age_days > 0,
            "retention.max_age_days must be > 0, got {}",
            self.retention.max_age_days
        );
        anyhow::ensure!(
            self.retention.sweep_interval_secs > 0,
            "retention.sweep_interval_secs must be > 0, got {}",
            self.retention.sweep_interval_secs
        );
        if let Some(schedule) = &self.retention.sweep_schedule {
            cron::Schedule::from_str(schedule).map_err(|e| {
                anyhow::anyhow!("retention.sweep_schedule {:?} is invalid: {}", schedule, e)
            })?;
        }
        if self.forwarder.enabled {
            anyhow::ensure!(
                !self.forwarder.url.is_empty(),
                "forwarder.url must be non-empty when the forwarder is enabled"
            );
            anyhow::ensure!(
                !self.forwarder.database.is_empty(),
                "forwarder.database must be non-empty when the forwarder is enabled"
            );
        }
        anyhow::ensure!(
            self.forwarder.poll_interval_secs > 0,
            "forwarder.poll_interval_secs must be > 0, got {}",
            self.forwarder.poll_interval_secs
        );
        anyhow::ensure!(
            self.forwarder.timeout_secs > 0,
            "forwarder.timeout_secs must be > 0, got {}",
            self.forwarder.timeout_secs
        );
        Ok(())
    }
}
