// Window summary: one immutable aggregate per aggregation run.
// Every statistic is optional; absent statistics are omitted from JSON, never zero-filled.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::SystemIdentity;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_1min_avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_1min_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_1min_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_5min_avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_15min_avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_min: Option<f64>,
}

impl CpuStats {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Percentages of total; swap has no minimum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_used_avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_used_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_used_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_used_avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_used_max: Option<f64>,
}

impl MemoryStats {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// `use_percent` statistics for one mount point over the snapshots it appeared in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskUsageStats {
    pub avg: f64,
    pub max: f64,
    pub min: f64,
}

/// Two-point rate between the first and last snapshot of the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceRates {
    pub rx_rate_mbps: f64,
    pub tx_rate_mbps: f64,
    /// Latest sample's cumulative value, not a delta. Absent when the producer omitted it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_errors: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_errors: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "timestamp")]
    pub generated_at: DateTime<Local>,
    pub period_secs: u64,
    #[serde(rename = "samples_count")]
    pub sample_count: usize,
    #[serde(rename = "cpu", default)]
    pub cpu_stats: CpuStats,
    #[serde(rename = "memory", default)]
    pub memory_stats: MemoryStats,
    #[serde(rename = "disk", default)]
    pub disk_stats: BTreeMap<String, DiskUsageStats>,
    #[serde(rename = "network", default)]
    pub network_stats: BTreeMap<String, InterfaceRates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemIdentity>,
}
