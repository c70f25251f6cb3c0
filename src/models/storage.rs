// Filesystem usage models

use serde::{Deserialize, Serialize};

use super::lenient;

/// Grouping key for filesystem records without a mount point.
pub const UNKNOWN_MOUNT: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilesystemSample {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub mount_point: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub total_kb: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub used_kb: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub available_kb: Option<u64>,
    /// As reported by df; not necessarily consistent with used/total.
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub use_percent: Option<f64>,
}

impl FilesystemSample {
    pub fn mount_key(&self) -> &str {
        self.mount_point.as_deref().unwrap_or(UNKNOWN_MOUNT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskSample {
    #[serde(default)]
    pub filesystems: Vec<FilesystemSample>,
}
