// HTML report rendering

use std::collections::BTreeMap;

use chrono::{Local, TimeZone};
use sysreport::models::*;
use sysreport::report::{DiskStatus, render_report};

fn empty_summary() -> Summary {
    Summary {
        generated_at: Local.timestamp_opt(1_700_000_000, 0).unwrap(),
        period_secs: 3600,
        sample_count: 12,
        cpu_stats: CpuStats::default(),
        memory_stats: MemoryStats::default(),
        disk_stats: BTreeMap::new(),
        network_stats: BTreeMap::new(),
        system: None,
    }
}

fn disk(avg: f64, max: f64) -> DiskUsageStats {
    DiskUsageStats { avg, max, min: avg }
}

/// Line of the rendered metric row holding `mount`, plus the following value span.
fn disk_row<'a>(html: &'a str, mount: &str) -> &'a str {
    let start = html
        .find(&format!(">{mount}:<"))
        .unwrap_or_else(|| panic!("no row for {mount}"));
    let rest = &html[start..];
    let end = rest.find("</div>").unwrap_or(rest.len());
    &rest[..end]
}

#[test]
fn test_disk_thresholds_render_status() {
    let mut summary = empty_summary();
    summary.disk_stats.insert("/crit".into(), disk(85.0, 95.0));
    summary.disk_stats.insert("/warn".into(), disk(70.0, 80.0));
    summary.disk_stats.insert("/ok".into(), disk(40.0, 50.0));
    let html = render_report(&summary);

    let crit = disk_row(&html, "/crit");
    assert!(crit.contains("status-critical"), "{crit}");
    assert!(crit.contains("critical"));
    let warn = disk_row(&html, "/warn");
    assert!(warn.contains("status-warning"), "{warn}");
    let ok = disk_row(&html, "/ok");
    assert!(ok.contains("status-good"), "{ok}");
    assert!(ok.contains("40.0% avg, 50.0% peak"), "{ok}");
}

#[test]
fn test_disk_status_classify() {
    assert_eq!(DiskStatus::classify(95.0), DiskStatus::Critical);
    assert_eq!(DiskStatus::classify(80.0), DiskStatus::Warning);
    assert_eq!(DiskStatus::classify(50.0), DiskStatus::Good);
}

#[test]
fn test_absent_blocks_are_omitted() {
    let html = render_report(&empty_summary());
    assert!(html.contains("System Monitoring Report"));
    assert!(html.contains("Samples: 12"));
    assert!(html.contains("Last 1 hour(s)"));
    assert!(!html.contains("System Information"));
    assert!(!html.contains("CPU Statistics"));
    assert!(!html.contains("Memory Statistics"));
    assert!(!html.contains("Disk Usage"));
    assert!(!html.contains("Network Statistics"));
}

#[test]
fn test_temperature_row_only_when_present() {
    let mut summary = empty_summary();
    summary.cpu_stats.load_1min_avg = Some(0.5);
    summary.cpu_stats.load_1min_max = Some(1.25);
    let html = render_report(&summary);
    assert!(html.contains("CPU Statistics"));
    assert!(html.contains("1.25"));
    assert!(!html.contains("Temperature"));

    summary.cpu_stats.temp_avg = Some(41.0);
    summary.cpu_stats.temp_max = Some(55.5);
    let html = render_report(&summary);
    assert!(html.contains("Peak Temperature"));
    assert!(html.contains("55.5"));
}

#[test]
fn test_memory_and_swap_rows() {
    let mut summary = empty_summary();
    summary.memory_stats.memory_used_avg = Some(42.25);
    summary.memory_stats.memory_used_max = Some(60.0);
    let html = render_report(&summary);
    assert!(html.contains("Memory Statistics"));
    assert!(html.contains("42.2%") || html.contains("42.3%"));
    assert!(!html.contains("Average Swap"));

    summary.memory_stats.swap_used_avg = Some(3.0);
    assert!(render_report(&summary).contains("Average Swap"));
}

#[test]
fn test_network_rows_omitted_when_producer_did_not_report_them() {
    let mut summary = empty_summary();
    summary.network_stats.insert(
        "wlan0".into(),
        InterfaceRates {
            rx_rate_mbps: 0.5,
            tx_rate_mbps: 0.5,
            rx_errors: None,
            tx_errors: Some(4),
            status: None,
        },
    );
    let html = render_report(&summary);
    assert!(html.contains("<h3>wlan0</h3>"));
    assert!(!html.contains("<small>"));
    assert!(!html.contains("RX Errors:"));
    assert!(html.contains("TX Errors:"));
    assert!(!html.contains("unknown"));
}

#[test]
fn test_network_and_system_blocks() {
    let mut summary = empty_summary();
    summary.network_stats.insert(
        "eth0".into(),
        InterfaceRates {
            rx_rate_mbps: 1.5,
            tx_rate_mbps: 0.25,
            rx_errors: Some(3),
            tx_errors: Some(0),
            status: Some("up".into()),
        },
    );
    summary.system = Some(SystemIdentity {
        hostname: Some("web<01>".into()),
        os_name: Some("Debian".into()),
        os_version: Some("12".into()),
        kernel: None,
        uptime_seconds: Some(7200.0),
    });
    let html = render_report(&summary);
    assert!(html.contains("Network Statistics"));
    assert!(html.contains("1.50 Mbps"));
    assert!(html.contains("0.25 Mbps"));
    assert!(html.contains("eth0 <small>(up)</small>"));
    assert!(html.contains("RX Errors:"));
    assert!(html.contains("web&lt;01&gt;"));
    assert!(!html.contains("web<01>"));
    assert!(html.contains("Debian 12"));
    assert!(html.contains("2.0 hours"));
}

#[test]
fn test_document_is_self_contained() {
    let mut summary = empty_summary();
    summary.disk_stats.insert("/".into(), disk(10.0, 10.0));
    let html = render_report(&summary);
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.trim_end().ends_with("</html>"));
    assert!(html.contains("<style>"));
    assert!(!html.contains("<link"));
    assert!(!html.contains("<script"));
    assert!(!html.contains("http://"));
    assert!(!html.contains("https://"));
}
