// Load averages and temperature. Each metric has its own sample set.

use crate::models::{CpuSample, CpuStats, Snapshot};

use super::describe;

pub fn aggregate(snapshots: &[Snapshot]) -> CpuStats {
    let samples: Vec<&CpuSample> = snapshots.iter().filter_map(|s| s.cpu.as_ref()).collect();
    let collect = |field: fn(&CpuSample) -> Option<f64>| -> Vec<f64> {
        samples.iter().filter_map(|c| field(c)).collect()
    };

    let load_1min = describe(&collect(|c| c.load_1min));
    let load_5min = describe(&collect(|c| c.load_5min));
    let load_15min = describe(&collect(|c| c.load_15min));
    // The "null" placeholder was already mapped to None while parsing.
    let temperature = describe(&collect(|c| c.temperature_celsius));

    CpuStats {
        load_1min_avg: load_1min.map(|d| d.mean),
        load_1min_max: load_1min.map(|d| d.max),
        load_1min_min: load_1min.map(|d| d.min),
        load_5min_avg: load_5min.map(|d| d.mean),
        load_15min_avg: load_15min.map(|d| d.mean),
        temp_avg: temperature.map(|d| d.mean),
        temp_max: temperature.map(|d| d.max),
        temp_min: temperature.map(|d| d.min),
    }
}
