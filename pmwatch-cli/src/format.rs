//! Table rendering and value humanization for terminal output.

use pmwatch_core::{ResourceSample, ServiceRecord, Snapshot};

/// Formats a byte count with a binary unit suffix
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Formats an uptime in seconds as `1d 2h 3m 4s`, omitting leading zeros
#[must_use]
pub fn format_uptime(secs: u64) -> String {
    if secs == 0 {
        return "-".to_string();
    }
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 || !parts.is_empty() {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 || !parts.is_empty() {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{seconds}s"));
    parts.join(" ")
}

/// Renders service records as an aligned table
#[must_use]
pub fn service_table(services: &[ServiceRecord]) -> String {
    let headers = ["ID", "NAME", "VERSION", "PORT", "STATUS", "CPU", "MEMORY", "UPTIME"];
    let rows: Vec<[String; 8]> = services
        .iter()
        .map(|s| {
            [
                s.id.to_string(),
                s.name.clone(),
                if s.version.is_empty() {
                    "-".to_string()
                } else {
                    s.version.clone()
                },
                s.port.map_or_else(|| "-".to_string(), |p| p.to_string()),
                format!("{}{}", s.status, if s.partial { "*" } else { "" }),
                format!("{:.1}%", s.cpu_percent),
                format_bytes(s.memory_bytes),
                format_uptime(s.uptime_secs),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut out = String::new();
    for (i, header) in headers.iter().enumerate() {
        out.push_str(&format!("{:<width$}  ", header, width = widths[i]));
    }
    out.push('\n');
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            out.push_str(&format!("{:<width$}  ", cell, width = widths[i]));
        }
        out.push('\n');
    }
    out
}

/// Renders the resource sample as a single status line
#[must_use]
pub fn resource_line(sample: &ResourceSample, stale: bool) -> String {
    format!(
        "CPU {:.1}%  Memory {:.0} MB / {:.0} MB ({:.1}%){}",
        sample.cpu_percent,
        sample.used_memory_mb,
        sample.total_memory_mb,
        sample.memory_percent(),
        if stale { "  [stale]" } else { "" }
    )
}

/// Renders a full snapshot: service table plus resource line
#[must_use]
pub fn snapshot_text(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Last updated: {}{}\n",
        snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        if snapshot.services_stale {
            "  [services stale]"
        } else {
            ""
        }
    ));
    out.push_str(&service_table(&snapshot.services));
    out.push_str(&resource_line(&snapshot.resources, snapshot.resources_stale));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmwatch_core::ServiceStatus;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(537_395_200), "512.5 MiB");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "-");
        assert_eq!(format_uptime(45), "45s");
        assert_eq!(format_uptime(3_661), "1h 1m 1s");
        assert_eq!(format_uptime(90_061), "1d 1h 1m 1s");
        // Leading-zero components appear once a larger unit is present
        assert_eq!(format_uptime(86_400), "1d 0h 0m 0s");
    }

    #[test]
    fn test_service_table_alignment() {
        let services = vec![ServiceRecord {
            id: 0,
            name: "api".into(),
            version: "2.1.0".into(),
            status: ServiceStatus::Online,
            cpu_percent: 1.5,
            memory_bytes: 52_428_800,
            uptime_secs: 3600,
            port: Some(8080),
            stdout_log_path: String::new(),
            stderr_log_path: String::new(),
            partial: false,
        }];
        let table = service_table(&services);
        assert!(table.contains("NAME"));
        assert!(table.contains("api"));
        assert!(table.contains("50.0 MiB"));
        assert!(table.contains("1h 0m 0s"));
    }

    #[test]
    fn test_partial_marker() {
        let services = vec![ServiceRecord {
            id: 1,
            name: "worker".into(),
            version: String::new(),
            status: ServiceStatus::Unknown,
            cpu_percent: 0.0,
            memory_bytes: 0,
            uptime_secs: 0,
            port: None,
            stdout_log_path: String::new(),
            stderr_log_path: String::new(),
            partial: true,
        }];
        let table = service_table(&services);
        assert!(table.contains("unknown*"));
    }
}
