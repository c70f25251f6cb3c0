// CPU, memory, host identity and the snapshot envelope written by the producer

use serde::{Deserialize, Serialize};

use super::lenient;
use super::{DiskSample, NetworkSample};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuSample {
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub load_1min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub load_5min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub load_15min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub core_count: Option<u64>,
    /// None when the sensor is unsupported, including the literal "null" placeholder.
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub temperature_celsius: Option<f64>,
}

/// Kilobyte counters from /proc/meminfo. `available_kb <= total_kb` is not guaranteed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySample {
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub total_kb: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub available_kb: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub swap_total_kb: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub swap_used_kb: Option<u64>,
}

/// Host identity; carried through to the summary untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemIdentity {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub os_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub kernel: Option<String>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<f64>,
}

/// One point-in-time observation (`metrics_<ts>.json`). Any top-level domain may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Seconds since epoch. The store falls back to the filename timestamp when the body lacks one.
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemorySample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<DiskSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemIdentity>,
}

impl Snapshot {
    /// Body timestamp, or 0 when the producer omitted it and no filename was available.
    pub fn ts(&self) -> i64 {
        self.timestamp.unwrap_or_default()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.system.as_ref().and_then(|s| s.hostname.as_deref())
    }
}
