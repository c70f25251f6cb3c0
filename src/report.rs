// HTML report rendering. Pure: Summary in, self-contained document out (inline CSS, no
// external fetches). Blocks whose statistics are absent are omitted entirely.

use std::fmt::Write;

use crate::models::{CpuStats, MemoryStats, Summary, SystemIdentity};

const CRITICAL_THRESHOLD: f64 = 90.0;
const WARNING_THRESHOLD: f64 = 75.0;

const STYLE: &str = r#"
        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            max-width: 1200px;
            margin: 0 auto;
            padding: 20px;
            background: #f5f5f5;
        }
        .header {
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            color: white;
            padding: 30px;
            border-radius: 10px;
            margin-bottom: 30px;
        }
        .header h1 { margin: 0; font-size: 2em; }
        .header .subtitle { opacity: 0.9; margin-top: 10px; }
        .section {
            background: white;
            padding: 25px;
            margin-bottom: 20px;
            border-radius: 10px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
        }
        .section h2 {
            margin-top: 0;
            color: #333;
            border-bottom: 2px solid #667eea;
            padding-bottom: 10px;
        }
        .metric {
            display: flex;
            justify-content: space-between;
            padding: 10px 0;
            border-bottom: 1px solid #eee;
        }
        .metric:last-child { border-bottom: none; }
        .metric-name { color: #666; }
        .metric-value { font-weight: bold; color: #333; }
        .status-good { color: #27ae60; }
        .status-warning { color: #f39c12; }
        .status-critical { color: #e74c3c; }
        .grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(250px, 1fr));
            gap: 20px;
        }
"#;

/// Three-tier classification of a mount point's peak usage. Thresholds are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskStatus {
    Good,
    Warning,
    Critical,
}

impl DiskStatus {
    pub fn classify(max_percent: f64) -> Self {
        if max_percent > CRITICAL_THRESHOLD {
            DiskStatus::Critical
        } else if max_percent > WARNING_THRESHOLD {
            DiskStatus::Warning
        } else {
            DiskStatus::Good
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            DiskStatus::Good => "status-good",
            DiskStatus::Warning => "status-warning",
            DiskStatus::Critical => "status-critical",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DiskStatus::Good => "good",
            DiskStatus::Warning => "warning",
            DiskStatus::Critical => "critical",
        }
    }
}

pub fn render_report(summary: &Summary) -> String {
    let mut html = String::with_capacity(8 * 1024);
    // fmt::Write into a String cannot fail.
    write_document(&mut html, summary).ok();
    html
}

fn write_document(out: &mut String, summary: &Summary) -> std::fmt::Result {
    write!(
        out,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>System Monitoring Report</title>
    <style>{STYLE}    </style>
</head>
<body>
    <div class="header">
        <h1>System Monitoring Report</h1>
        <div class="subtitle">
            Generated: {generated}<br>
            Period: Last {period} | Samples: {samples}
        </div>
    </div>
"#,
        generated = summary.generated_at.format("%Y-%m-%d %H:%M:%S %:z"),
        period = format_period(summary.period_secs),
        samples = summary.sample_count,
    )?;

    if let Some(system) = &summary.system {
        write_system(out, system)?;
    }
    write_cpu(out, &summary.cpu_stats)?;
    write_memory(out, &summary.memory_stats)?;
    write_disks(out, summary)?;
    write_network(out, summary)?;

    out.push_str("</body>\n</html>\n");
    Ok(())
}

fn write_system(out: &mut String, system: &SystemIdentity) -> std::fmt::Result {
    out.push_str("    <div class=\"section\">\n        <h2>System Information</h2>\n");
    let text = |v: &Option<String>| escape_html(v.as_deref().unwrap_or("N/A"));
    let os = match (&system.os_name, &system.os_version) {
        (Some(name), Some(version)) => format!("{name} {version}"),
        (Some(name), None) => name.clone(),
        (None, Some(version)) => version.clone(),
        (None, None) => "N/A".to_string(),
    };
    metric_row(out, "Hostname:", &text(&system.hostname), None)?;
    metric_row(out, "OS:", &escape_html(&os), None)?;
    metric_row(out, "Kernel:", &text(&system.kernel), None)?;
    if let Some(uptime) = system.uptime_seconds {
        metric_row(out, "Uptime:", &format!("{:.1} hours", uptime / 3600.0), None)?;
    }
    out.push_str("    </div>\n");
    Ok(())
}

fn write_cpu(out: &mut String, cpu: &CpuStats) -> std::fmt::Result {
    let load = cpu.load_1min_avg.zip(cpu.load_1min_max);
    let temp = cpu.temp_avg.zip(cpu.temp_max);
    if load.is_none() && temp.is_none() {
        return Ok(());
    }
    out.push_str(
        "    <div class=\"section\">\n        <h2>CPU Statistics</h2>\n        <div class=\"grid\">\n",
    );
    if let Some((avg, max)) = load {
        metric_row(out, "Average Load (1min):", &format!("{avg:.2}"), None)?;
        metric_row(out, "Peak Load (1min):", &format!("{max:.2}"), None)?;
    }
    if let Some((avg, max)) = temp {
        metric_row(out, "Average Temperature:", &format!("{avg:.1}&deg;C"), None)?;
        metric_row(out, "Peak Temperature:", &format!("{max:.1}&deg;C"), None)?;
    }
    out.push_str("        </div>\n    </div>\n");
    Ok(())
}

fn write_memory(out: &mut String, memory: &MemoryStats) -> std::fmt::Result {
    let usage = memory.memory_used_avg.zip(memory.memory_used_max);
    if usage.is_none() && memory.swap_used_avg.is_none() {
        return Ok(());
    }
    out.push_str(
        "    <div class=\"section\">\n        <h2>Memory Statistics</h2>\n        <div class=\"grid\">\n",
    );
    if let Some((avg, max)) = usage {
        metric_row(out, "Average Usage:", &format!("{avg:.1}%"), None)?;
        metric_row(out, "Peak Usage:", &format!("{max:.1}%"), None)?;
    }
    if let Some(swap) = memory.swap_used_avg {
        metric_row(out, "Average Swap:", &format!("{swap:.1}%"), None)?;
    }
    out.push_str("        </div>\n    </div>\n");
    Ok(())
}

fn write_disks(out: &mut String, summary: &Summary) -> std::fmt::Result {
    if summary.disk_stats.is_empty() {
        return Ok(());
    }
    out.push_str("    <div class=\"section\">\n        <h2>Disk Usage</h2>\n");
    for (mount, stats) in &summary.disk_stats {
        let status = DiskStatus::classify(stats.max);
        metric_row(
            out,
            &format!("{}:", escape_html(mount)),
            &format!(
                "{:.1}% avg, {:.1}% peak ({})",
                stats.avg,
                stats.max,
                status.label()
            ),
            Some(status.css_class()),
        )?;
    }
    out.push_str("    </div>\n");
    Ok(())
}

fn write_network(out: &mut String, summary: &Summary) -> std::fmt::Result {
    if summary.network_stats.is_empty() {
        return Ok(());
    }
    out.push_str("    <div class=\"section\">\n        <h2>Network Statistics</h2>\n");
    for (iface, stats) in &summary.network_stats {
        match &stats.status {
            Some(status) => writeln!(
                out,
                "        <h3>{} <small>({})</small></h3>",
                escape_html(iface),
                escape_html(status)
            )?,
            None => writeln!(out, "        <h3>{}</h3>", escape_html(iface))?,
        }
        metric_row(out, "RX Rate:", &format!("{:.2} Mbps", stats.rx_rate_mbps), None)?;
        metric_row(out, "TX Rate:", &format!("{:.2} Mbps", stats.tx_rate_mbps), None)?;
        if let Some(errors) = stats.rx_errors {
            metric_row(out, "RX Errors:", &errors.to_string(), None)?;
        }
        if let Some(errors) = stats.tx_errors {
            metric_row(out, "TX Errors:", &errors.to_string(), None)?;
        }
    }
    out.push_str("    </div>\n");
    Ok(())
}

/// `name` and `value` are inserted verbatim; callers escape user-supplied text.
fn metric_row(
    out: &mut String,
    name: &str,
    value: &str,
    status_class: Option<&str>,
) -> std::fmt::Result {
    let class = match status_class {
        Some(c) => format!("metric-value {c}"),
        None => "metric-value".to_string(),
    };
    write!(
        out,
        r#"            <div class="metric">
                <span class="metric-name">{name}</span>
                <span class="{class}">{value}</span>
            </div>
"#
    )
}

/// "1 hour(s)" for whole hours, "N minute(s)" for whole minutes, seconds otherwise.
pub fn format_period(secs: u64) -> String {
    if secs > 0 && secs % 3600 == 0 {
        format!("{} hour(s)", secs / 3600)
    } else if secs > 0 && secs % 60 == 0 {
        format!("{} minute(s)", secs / 60)
    } else {
        format!("{secs} second(s)")
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn period_formats() {
        assert_eq!(format_period(3600), "1 hour(s)");
        assert_eq!(format_period(86_400), "24 hour(s)");
        assert_eq!(format_period(900), "15 minute(s)");
        assert_eq!(format_period(45), "45 second(s)");
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(DiskStatus::classify(90.0), DiskStatus::Warning);
        assert_eq!(DiskStatus::classify(90.1), DiskStatus::Critical);
        assert_eq!(DiskStatus::classify(75.0), DiskStatus::Good);
        assert_eq!(DiskStatus::classify(75.5), DiskStatus::Warning);
    }
}
