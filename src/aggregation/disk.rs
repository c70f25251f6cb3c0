// Per-mount-point use_percent statistics over the subset of the window each mount appears in.

use std::collections::BTreeMap;

use crate::models::{DiskUsageStats, Snapshot};

use super::describe;

pub fn aggregate(snapshots: &[Snapshot]) -> BTreeMap<String, DiskUsageStats> {
    let mut by_mount: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for disk in snapshots.iter().filter_map(|s| s.disk.as_ref()) {
        for fs in &disk.filesystems {
            if let Some(percent) = fs.use_percent {
                by_mount.entry(fs.mount_key()).or_default().push(percent);
            }
        }
    }

    by_mount
        .into_iter()
        .filter_map(|(mount, values)| {
            let d = describe(&values)?;
            Some((
                mount.to_string(),
                DiskUsageStats {
                    avg: d.mean,
                    max: d.max,
                    min: d.min,
                },
            ))
        })
        .collect()
}
