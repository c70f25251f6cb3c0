// Two-point interface rates between the first and last snapshot of the window.
// Intermediate samples are ignored; interfaces missing from either endpoint are dropped.

use std::collections::{BTreeMap, HashMap};

use crate::models::{InterfaceRates, InterfaceSample, Snapshot};

const BITS_PER_BYTE: f64 = 8.0;
const BITS_PER_MEGABIT: f64 = 1_000_000.0;

pub fn aggregate(snapshots: &[Snapshot]) -> BTreeMap<String, InterfaceRates> {
    let mut out = BTreeMap::new();
    let (Some(first), Some(last)) = (snapshots.first(), snapshots.last()) else {
        return out;
    };
    if snapshots.len() < 2 {
        return out;
    }
    let time_diff = last.ts() - first.ts();
    if time_diff <= 0 {
        return out;
    }

    let first_by_name = interfaces_by_name(first);
    for (name, end) in interfaces_by_name(last) {
        let Some(start) = first_by_name.get(name) else {
            continue;
        };
        let (Some(rx_rate_mbps), Some(tx_rate_mbps)) = (
            rate_mbps(start.rx_bytes, end.rx_bytes, time_diff),
            rate_mbps(start.tx_bytes, end.tx_bytes, time_diff),
        ) else {
            tracing::debug!(interface = name, "byte counters missing at an endpoint");
            continue;
        };
        out.insert(
            name.to_string(),
            InterfaceRates {
                rx_rate_mbps,
                tx_rate_mbps,
                rx_errors: end.rx_errors,
                tx_errors: end.tx_errors,
                status: end.status.clone(),
            },
        );
    }
    out
}

fn interfaces_by_name(snapshot: &Snapshot) -> HashMap<&str, &InterfaceSample> {
    snapshot
        .network
        .iter()
        .flat_map(|n| &n.interfaces)
        .filter_map(|i| Some((i.interface.as_deref()?, i)))
        .collect()
}

/// Megabits per second, rounded to 2 decimals. A counter reset yields a negative rate.
fn rate_mbps(first: Option<u64>, last: Option<u64>, time_diff: i64) -> Option<f64> {
    let delta = last? as f64 - first? as f64;
    Some(round2(delta * BITS_PER_BYTE / (time_diff as f64 * BITS_PER_MEGABIT)))
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
