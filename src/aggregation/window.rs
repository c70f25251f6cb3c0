// Window selection: snapshots at or after `reference_time - duration`, ascending.
// No upper bound: a snapshot stamped after the reference time is still included.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::models::Snapshot;

/// Inclusive lower bound of the window.
pub fn window_start(reference_time: i64, duration: Duration) -> i64 {
    let secs = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
    reference_time.saturating_sub(secs)
}

/// Selects the window out of a timestamp-keyed set. Malformed names never reach
/// this map; the store has already skipped them.
pub fn select_window(
    snapshots: BTreeMap<i64, Snapshot>,
    reference_time: i64,
    duration: Duration,
) -> Vec<Snapshot> {
    let mut snapshots = snapshots;
    snapshots
        .split_off(&window_start(reference_time, duration))
        .into_values()
        .collect()
}
