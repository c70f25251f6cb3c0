// InfluxDB line protocol: one point per metric group per snapshot.
// measurement[,tag=value...] field=value[,field=value...] timestamp

use crate::models::Snapshot;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: &'static str,
    pub tags: Vec<(&'static str, String)>,
    pub fields: Vec<(&'static str, FieldValue)>,
    /// Seconds since epoch; written with `precision=s`.
    pub timestamp: i64,
}

impl Point {
    fn new(measurement: &'static str, host: &str, timestamp: i64) -> Self {
        Self {
            measurement,
            tags: vec![("host", host.to_string())],
            fields: Vec::new(),
            timestamp,
        }
    }

    fn tag(mut self, key: &'static str, value: Option<&str>) -> Self {
        self.tags.push((key, value.unwrap_or(UNKNOWN).to_string()));
        self
    }

    fn field(mut self, key: &'static str, value: Option<impl Into<FieldValue>>) -> Self {
        if let Some(v) = value {
            self.fields.push((key, v.into()));
        }
        self
    }

    /// One line, without trailing newline. Tags are sorted by key as the server prefers.
    pub fn to_line(&self) -> String {
        let mut line = escape(self.measurement, &[',', ' ']);
        let mut tags: Vec<_> = self.tags.iter().filter(|(_, v)| !v.is_empty()).collect();
        tags.sort_by_key(|(k, _)| *k);
        for (key, value) in tags {
            line.push(',');
            line.push_str(&escape(key, &[',', '=', ' ']));
            line.push('=');
            line.push_str(&escape(value, &[',', '=', ' ']));
        }
        for (i, (key, value)) in self.fields.iter().enumerate() {
            line.push(if i == 0 { ' ' } else { ',' });
            line.push_str(&escape(key, &[',', '=', ' ']));
            line.push('=');
            match value {
                FieldValue::Float(f) => line.push_str(&format!("{f:?}")),
                FieldValue::Integer(n) => line.push_str(&format!("{n}i")),
            }
        }
        line.push_str(&format!(" {}", self.timestamp));
        line
    }
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// All points for one snapshot. Only present fields are written and points left
/// without fields are dropped (a line needs at least one field).
pub fn snapshot_points(snapshot: &Snapshot) -> Vec<Point> {
    let ts = snapshot.ts();
    let host = snapshot.hostname().unwrap_or(UNKNOWN);
    let mut points = Vec::new();

    if let Some(cpu) = &snapshot.cpu {
        points.push(
            Point::new("cpu", host, ts)
                .field("load_1min", cpu.load_1min)
                .field("load_5min", cpu.load_5min)
                .field("load_15min", cpu.load_15min)
                .field("core_count", cpu.core_count),
        );
        points.push(
            Point::new("cpu_temperature", host, ts).field("celsius", cpu.temperature_celsius),
        );
    }

    if let Some(memory) = &snapshot.memory {
        if let (Some(total), Some(available)) = (memory.total_kb, memory.available_kb)
            && total > 0
        {
            let used = total.saturating_sub(available);
            points.push(
                Point::new("memory", host, ts)
                    .field("total_kb", Some(total))
                    .field("used_kb", Some(used))
                    .field("available_kb", Some(available))
                    .field(
                        "used_percent",
                        Some((total as f64 - available as f64) / total as f64 * 100.0),
                    ),
            );
        }
        if let (Some(total), Some(used)) = (memory.swap_total_kb, memory.swap_used_kb)
            && total > 0
        {
            points.push(
                Point::new("swap", host, ts)
                    .field("total_kb", Some(total))
                    .field("used_kb", Some(used))
                    .field("used_percent", Some(used as f64 / total as f64 * 100.0)),
            );
        }
    }

    for fs in snapshot.disk.iter().flat_map(|d| &d.filesystems) {
        points.push(
            Point::new("disk", host, ts)
                .tag("mount_point", Some(fs.mount_key()))
                .tag("device", fs.device.as_deref())
                .field("total_kb", fs.total_kb)
                .field("used_kb", fs.used_kb)
                .field("available_kb", fs.available_kb)
                .field("used_percent", fs.use_percent),
        );
    }

    for iface in snapshot.network.iter().flat_map(|n| &n.interfaces) {
        let Some(name) = iface.interface.as_deref() else {
            continue;
        };
        points.push(
            Point::new("network", host, ts)
                .tag("interface", Some(name))
                .field("rx_bytes", iface.rx_bytes)
                .field("tx_bytes", iface.tx_bytes)
                .field("rx_packets", iface.rx_packets)
                .field("tx_packets", iface.tx_packets)
                .field("rx_errors", iface.rx_errors)
                .field("tx_errors", iface.tx_errors),
        );
    }

    points.retain(|p| !p.fields.is_empty());
    points
}

/// Newline-separated body for one `/write` request.
pub fn encode(points: &[Point]) -> String {
    points
        .iter()
        .map(Point::to_line)
        .collect::<Vec<_>>()
        .join("\n")
}
