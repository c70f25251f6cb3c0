// Memory and swap utilisation percentages.

use crate::models::{MemoryStats, Snapshot};

use super::describe;

pub fn aggregate(snapshots: &[Snapshot]) -> MemoryStats {
    let mut used_percent = Vec::with_capacity(snapshots.len());
    let mut swap_percent = Vec::with_capacity(snapshots.len());

    for memory in snapshots.iter().filter_map(|s| s.memory.as_ref()) {
        // total_kb == 0 would divide by zero; such samples are excluded, not counted as 0%.
        if let (Some(total), Some(available)) = (memory.total_kb, memory.available_kb)
            && total > 0
        {
            // f64 so that available > total yields a negative share instead of underflowing.
            used_percent.push((total as f64 - available as f64) / total as f64 * 100.0);
        }
        if let (Some(total), Some(used)) = (memory.swap_total_kb, memory.swap_used_kb)
            && total > 0
        {
            swap_percent.push(used as f64 / total as f64 * 100.0);
        }
    }

    let memory = describe(&used_percent);
    let swap = describe(&swap_percent);
    MemoryStats {
        memory_used_avg: memory.map(|d| d.mean),
        memory_used_max: memory.map(|d| d.max),
        memory_used_min: memory.map(|d| d.min),
        swap_used_avg: swap.map(|d| d.mean),
        swap_used_max: swap.map(|d| d.max),
    }
}
