// Aggregation engine: window selection, four independent domain aggregators and the
// summary builder that composes them. Pure and synchronous; snapshots are already in memory.

pub mod cpu;
pub mod disk;
pub mod memory;
pub mod network;
pub mod window;

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::error::ProcessorError;
use crate::models::{Snapshot, Summary};

pub use window::{select_window, window_start};

/// Selects the window ending at `reference_time` and summarizes it.
pub fn build_summary(
    snapshots: BTreeMap<i64, Snapshot>,
    reference_time: i64,
    window: Duration,
    generated_at: DateTime<Local>,
) -> Result<Summary, ProcessorError> {
    let selected = select_window(snapshots, reference_time, window);
    summarize(&selected, window, generated_at)
}

/// Summarizes an already selected, ascending window. An empty window is
/// `NoDataAvailable`, distinct from a sparse but valid summary.
pub fn summarize(
    snapshots: &[Snapshot],
    window: Duration,
    generated_at: DateTime<Local>,
) -> Result<Summary, ProcessorError> {
    let Some(last) = snapshots.last() else {
        return Err(ProcessorError::NoDataAvailable {
            window_secs: window.as_secs(),
        });
    };

    Ok(Summary {
        generated_at,
        period_secs: window.as_secs(),
        sample_count: snapshots.len(),
        cpu_stats: cpu::aggregate(snapshots),
        memory_stats: memory::aggregate(snapshots),
        disk_stats: disk::aggregate(snapshots),
        network_stats: network::aggregate(snapshots),
        system: last.system.clone(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Described {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

/// Mean, max and min of a sample set; None for an empty set.
pub(crate) fn describe(values: &[f64]) -> Option<Described> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    Some(Described { mean, max, min })
}
