// Shared test helpers

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use sysreport::models::*;

pub fn snapshot(timestamp: i64) -> Snapshot {
    Snapshot {
        timestamp: Some(timestamp),
        ..Default::default()
    }
}

pub fn with_load(mut s: Snapshot, load_1min: f64) -> Snapshot {
    s.cpu = Some(CpuSample {
        load_1min: Some(load_1min),
        load_5min: Some(load_1min),
        load_15min: Some(load_1min),
        core_count: Some(4),
        temperature_celsius: None,
    });
    s
}

pub fn with_memory(mut s: Snapshot, total_kb: u64, available_kb: u64) -> Snapshot {
    s.memory = Some(MemorySample {
        total_kb: Some(total_kb),
        available_kb: Some(available_kb),
        swap_total_kb: None,
        swap_used_kb: None,
    });
    s
}

pub fn with_disk(mut s: Snapshot, mount: &str, use_percent: f64) -> Snapshot {
    let disk = s.disk.get_or_insert_with(DiskSample::default);
    disk.filesystems.push(FilesystemSample {
        mount_point: Some(mount.to_string()),
        device: Some("/dev/sda1".to_string()),
        use_percent: Some(use_percent),
        ..Default::default()
    });
    s
}

pub fn with_interface(mut s: Snapshot, name: &str, rx_bytes: u64, tx_bytes: u64) -> Snapshot {
    let network = s.network.get_or_insert_with(NetworkSample::default);
    network.interfaces.push(InterfaceSample {
        interface: Some(name.to_string()),
        rx_bytes: Some(rx_bytes),
        tx_bytes: Some(tx_bytes),
        rx_errors: Some(0),
        tx_errors: Some(0),
        status: Some("up".to_string()),
        ..Default::default()
    });
    s
}

pub fn with_hostname(mut s: Snapshot, hostname: &str) -> Snapshot {
    s.system = Some(SystemIdentity {
        hostname: Some(hostname.to_string()),
        os_name: Some("Debian GNU/Linux".to_string()),
        os_version: Some("12".to_string()),
        kernel: Some("6.1.0".to_string()),
        uptime_seconds: Some(7200.0),
    });
    s
}

/// A snapshot body the way the producer writes it, including string-typed numbers.
pub fn producer_json(timestamp: i64, load_1min: &str) -> Value {
    json!({
        "timestamp": timestamp,
        "cpu": {
            "load_1min": load_1min,
            "load_5min": "0.40",
            "load_15min": "0.30",
            "core_count": 4,
            "temperature_celsius": "null"
        },
        "memory": {
            "total_kb": 8_000_000,
            "available_kb": 6_000_000,
            "swap_total_kb": 0,
            "swap_used_kb": 0
        },
        "disk": {
            "filesystems": [
                {"mount_point": "/", "device": "/dev/sda1", "total_kb": 100, "used_kb": 50, "available_kb": 50, "use_percent": "50%"}
            ]
        },
        "network": {
            "interfaces": [
                {"interface": "eth0", "rx_bytes": timestamp * 1000, "tx_bytes": timestamp * 500, "rx_errors": 0, "tx_errors": 0, "status": "up"}
            ]
        },
        "system": {
            "hostname": "testhost",
            "os_name": "Debian GNU/Linux",
            "os_version": "12",
            "kernel": "6.1.0",
            "uptime_seconds": 3600
        }
    })
}

pub fn write_snapshot(dir: &Path, timestamp: i64, body: &Value) -> PathBuf {
    let path = dir.join(format!("metrics_{timestamp}.json"));
    std::fs::write(&path, serde_json::to_vec(body).unwrap()).unwrap();
    path
}

pub fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"x").unwrap();
    path
}
