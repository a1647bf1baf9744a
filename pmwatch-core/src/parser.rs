//! Parsers for remote command output
//!
//! Every parser is a pure function from raw text to typed records. The
//! process manager's CLI is the primary source of drift: different versions
//! reorder table columns, localize decimal separators, and prefix output
//! with log noise. The policy throughout is defensive: unexpected lines are
//! ignored, a field that cannot be parsed becomes its zero value and flags
//! the record `partial`, and numeric values are clamped to their valid
//! ranges instead of failing the cycle.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;

use crate::error::{MonitorError, MonitorResult};
use crate::models::{ServiceRecord, ServiceStatus};

/// Parses a float accepting both `.` and `,` as the decimal separator
///
/// `"3,42"` (mpstat under a European locale) parses the same as `"3.42"`.
/// Thousands separators in mixed forms like `"1,234.5"` are stripped.
#[must_use]
pub fn parse_locale_float(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let normalized = if s.contains(',') && s.contains('.') {
        s.replace(',', "")
    } else {
        s.replace(',', ".")
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalizes a memory string with an optional binary unit suffix to bytes
///
/// `"512.4mb"` becomes `512.4 * 1024^2` rounded to the nearest byte; a bare
/// number is taken as bytes. Negative values clamp to zero.
#[must_use]
pub fn parse_memory_bytes(raw: &str) -> Option<u64> {
    let s = raw.trim().to_ascii_lowercase();
    if s.is_empty() {
        return None;
    }
    let numeric_end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ',' || c == '-'))
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(numeric_end);
    let value = parse_locale_float(number)?;
    let multiplier: f64 = match suffix.trim() {
        "" | "b" => 1.0,
        "k" | "kb" | "kib" => 1024.0,
        "m" | "mb" | "mib" => 1024.0 * 1024.0,
        "g" | "gb" | "gib" => 1024.0 * 1024.0 * 1024.0,
        "t" | "tb" | "tib" => 1024.0f64.powi(4),
        _ => return None,
    };
    Some((value * multiplier).round().max(0.0) as u64)
}

/// Parses a CPU percentage cell such as `"0%"` or `"12,5"`
///
/// The result is clamped to be non-negative.
#[must_use]
pub fn parse_cpu_cell(raw: &str) -> Option<f32> {
    let s = raw.trim().trim_end_matches('%').trim();
    parse_locale_float(s).map(|v| v.max(0.0) as f32)
}

/// Parses an uptime cell such as `"14D"`, `"2h"`, `"1d 3h"`, or `"90"`
///
/// A bare number is taken as seconds.
#[must_use]
pub fn parse_uptime_cell(raw: &str) -> Option<u64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let mut total: u64 = 0;
    for part in s.split_whitespace() {
        let lower = part.to_ascii_lowercase();
        let (number, factor) = match lower.chars().last()? {
            'd' => (&lower[..lower.len() - 1], 86_400),
            'h' => (&lower[..lower.len() - 1], 3_600),
            'm' => (&lower[..lower.len() - 1], 60),
            's' => (&lower[..lower.len() - 1], 1),
            _ => (lower.as_str(), 1),
        };
        let value = parse_locale_float(number)?;
        if value < 0.0 {
            return None;
        }
        total += (value * factor as f64).round() as u64;
    }
    Some(total)
}

// ---------------------------------------------------------------------------
// Service list
// ---------------------------------------------------------------------------

/// Typed subset of one process entry in the JSON listing
#[derive(Debug, Default, Deserialize)]
struct JsonProcess {
    #[serde(default)]
    pm_id: Option<i64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    pm2_env: JsonEnv,
    #[serde(default)]
    monit: JsonMonit,
}

#[derive(Debug, Default, Deserialize)]
struct JsonEnv {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    version: Option<String>,
    /// Epoch milliseconds of the last process start
    #[serde(default)]
    pm_uptime: Option<i64>,
    #[serde(default, rename = "PORT")]
    port: Option<serde_json::Value>,
    #[serde(default)]
    pm_out_log_path: Option<String>,
    #[serde(default)]
    pm_err_log_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonMonit {
    #[serde(default)]
    cpu: Option<f64>,
    #[serde(default)]
    memory: Option<f64>,
}

/// Stateless parser for the process manager's service listing
pub struct ServiceListParser;

impl ServiceListParser {
    /// Parses a service listing, preferring the JSON form
    ///
    /// Falls back to the tabular form when no JSON array can be extracted,
    /// which covers process-manager builds that prefix the listing with log
    /// noise or only offer the table.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Parse`] when neither form yields records.
    pub fn parse(raw: &str, now: DateTime<Utc>) -> MonitorResult<Vec<ServiceRecord>> {
        match Self::parse_json(raw, now) {
            Ok(records) => Ok(records),
            Err(json_err) => Self::parse_table(raw).map_err(|_| json_err),
        }
    }

    /// Parses the JSON (`jlist`) form of the listing
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Parse`] when the output contains no valid
    /// JSON array.
    pub fn parse_json(raw: &str, now: DateTime<Utc>) -> MonitorResult<Vec<ServiceRecord>> {
        // Some builds print update notices (themselves bracketed, like
        // "[PM2] ...") before the array. The listing array is the first `[`
        // whose next non-whitespace character opens an object or closes the
        // array immediately.
        let start = raw
            .char_indices()
            .filter(|&(_, c)| c == '[')
            .find(|&(i, _)| {
                raw[i + 1..]
                    .chars()
                    .find(|c| !c.is_whitespace())
                    .is_some_and(|c| matches!(c, '{' | ']'))
            })
            .map(|(i, _)| i)
            .ok_or_else(|| MonitorError::Parse("no JSON array in service listing".into()))?;
        let end = raw
            .rfind(']')
            .filter(|&end| end > start)
            .ok_or_else(|| MonitorError::Parse("unterminated JSON array".into()))?;
        let body = &raw[start..=end];

        let processes: Vec<JsonProcess> = serde_json::from_str(body)
            .map_err(|e| MonitorError::Parse(format!("service listing: {e}")))?;

        Ok(processes
            .into_iter()
            .map(|p| Self::record_from_json(p, now))
            .collect())
    }

    fn record_from_json(p: JsonProcess, now: DateTime<Utc>) -> ServiceRecord {
        let mut partial = false;

        let id = p.pm_id.unwrap_or_else(|| {
            partial = true;
            0
        });
        let name = p.name.unwrap_or_else(|| {
            partial = true;
            String::new()
        });
        let status = match p.pm2_env.status.as_deref() {
            Some(raw) => ServiceStatus::from_raw(raw),
            None => {
                partial = true;
                ServiceStatus::Unknown
            }
        };

        let cpu_percent = p.monit.cpu.map_or_else(
            || {
                partial = true;
                0.0
            },
            |v| v.max(0.0) as f32,
        );
        let memory_bytes = p.monit.memory.map_or_else(
            || {
                partial = true;
                0
            },
            |v| v.round().max(0.0) as u64,
        );

        let uptime_secs = if status == ServiceStatus::Online {
            p.pm2_env
                .pm_uptime
                .map(|started_ms| {
                    let elapsed_ms = now.timestamp_millis().saturating_sub(started_ms);
                    (elapsed_ms / 1000).max(0) as u64
                })
                .unwrap_or(0)
        } else {
            0
        };

        let port = p.pm2_env.port.as_ref().and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
            serde_json::Value::String(s) => s.trim().parse::<u16>().ok(),
            _ => None,
        });

        ServiceRecord {
            id,
            name,
            version: p.pm2_env.version.unwrap_or_default(),
            status,
            cpu_percent,
            memory_bytes,
            uptime_secs,
            port,
            stdout_log_path: p.pm2_env.pm_out_log_path.unwrap_or_default(),
            stderr_log_path: p.pm2_env.pm_err_log_path.unwrap_or_default(),
            partial,
        }
    }

    /// Parses the box-drawn table form of the listing
    ///
    /// Columns are identified by header name, so reordered or additional
    /// columns do not affect the result. Rows whose id cell is not numeric
    /// (borders, separators, log noise) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Parse`] when no header row can be found.
    pub fn parse_table(raw: &str) -> MonitorResult<Vec<ServiceRecord>> {
        let rows: Vec<Vec<String>> = raw
            .lines()
            .filter(|line| line.contains('│') || line.contains('|'))
            .map(split_table_row)
            .filter(|cells| !cells.is_empty())
            .collect();

        let header_pos = rows
            .iter()
            .position(|cells| {
                let lower: Vec<String> = cells.iter().map(|c| c.to_ascii_lowercase()).collect();
                lower.iter().any(|c| c == "id") && lower.iter().any(|c| c == "name")
            })
            .ok_or_else(|| MonitorError::Parse("no header row in service table".into()))?;

        let header: Vec<String> = rows[header_pos]
            .iter()
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let col = |names: &[&str]| -> Option<usize> {
            header
                .iter()
                .position(|h| names.contains(&h.as_str()))
        };

        let id_col = col(&["id"])
            .ok_or_else(|| MonitorError::Parse("service table has no id column".into()))?;
        let name_col = col(&["name", "app name"]);
        let version_col = col(&["version"]);
        let status_col = col(&["status"]);
        let cpu_col = col(&["cpu", "cpu (%)"]);
        let mem_col = col(&["mem", "memory", "memory (mb)"]);
        let uptime_col = col(&["uptime"]);

        let mut records = Vec::new();
        for cells in rows.iter().skip(header_pos + 1) {
            let Some(id) = cells
                .get(id_col)
                .and_then(|c| c.trim().parse::<i64>().ok())
            else {
                continue;
            };

            let mut partial = false;
            let cell = |idx: Option<usize>| -> Option<&str> {
                idx.and_then(|i| cells.get(i)).map(String::as_str)
            };

            let name = cell(name_col).unwrap_or("").to_string();
            if name.is_empty() {
                partial = true;
            }
            let status = cell(status_col).map_or_else(
                || {
                    partial = true;
                    ServiceStatus::Unknown
                },
                ServiceStatus::from_raw,
            );
            let cpu_percent = cell(cpu_col).and_then(parse_cpu_cell).unwrap_or_else(|| {
                partial = true;
                0.0
            });
            let memory_bytes = cell(mem_col).and_then(parse_memory_bytes).unwrap_or_else(|| {
                partial = true;
                0
            });
            let uptime_secs = if status == ServiceStatus::Online {
                cell(uptime_col).and_then(parse_uptime_cell).unwrap_or_else(|| {
                    partial = true;
                    0
                })
            } else {
                0
            };

            records.push(ServiceRecord {
                id,
                name,
                version: cell(version_col).unwrap_or("").to_string(),
                status,
                cpu_percent,
                memory_bytes,
                uptime_secs,
                port: None,
                stdout_log_path: String::new(),
                stderr_log_path: String::new(),
                partial,
            });
        }

        Ok(records)
    }
}

fn split_table_row(line: &str) -> Vec<String> {
    line.split(['│', '|'])
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .filter(|cell| !cell.chars().all(|c| matches!(c, '─' | '-' | '┼' | '┬' | '┴')))
        .map(ToString::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// System resources
// ---------------------------------------------------------------------------

/// Stateless parser for system CPU and memory command output
pub struct ResourceParser;

impl ResourceParser {
    /// Parses the mpstat pipeline output: one busy-percentage per line
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Parse`] when no line contains a number.
    pub fn parse_cpu_mpstat(raw: &str) -> MonitorResult<f32> {
        raw.lines()
            .find_map(parse_cpu_cell)
            .map(|v| v.clamp(0.0, 100.0))
            .ok_or_else(|| MonitorError::Parse("no CPU value in mpstat output".into()))
    }

    /// Parses the `top` fallback: busy = 100 minus the idle percentage
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Parse`] when no idle percentage is present.
    pub fn parse_cpu_top(raw: &str) -> MonitorResult<f32> {
        static IDLE_RE: OnceLock<Regex> = OnceLock::new();
        let re = IDLE_RE.get_or_init(|| {
            Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*%?\s*id").expect("static regex")
        });

        let idle = re
            .captures(raw)
            .and_then(|caps| parse_locale_float(&caps[1]))
            .ok_or_else(|| MonitorError::Parse("no idle percentage in top output".into()))?;

        Ok(((100.0 - idle).max(0.0) as f32).clamp(0.0, 100.0))
    }

    /// Parses `free -m` output into (used, total) mebibytes
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Parse`] when the memory line is missing or
    /// truncated.
    pub fn parse_memory_free(raw: &str) -> MonitorResult<(f64, f64)> {
        let line = raw
            .lines()
            .find(|line| line.trim_start().starts_with("Mem"))
            .ok_or_else(|| MonitorError::Parse("no Mem line in free output".into()))?;

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            return Err(MonitorError::Parse("too few fields in free output".into()));
        }

        let total = parse_locale_float(parts[1])
            .ok_or_else(|| MonitorError::Parse("unparseable total memory".into()))?
            .max(0.0);
        let used = parse_locale_float(parts[2])
            .ok_or_else(|| MonitorError::Parse("unparseable used memory".into()))?
            .clamp(0.0, total);

        Ok((used, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    const JLIST_FIXTURE: &str = r#"[
      {
        "pm_id": 0,
        "name": "api",
        "pm2_env": {
          "status": "online",
          "version": "2.1.0",
          "pm_uptime": 1699996400000,
          "PORT": "8080",
          "pm_out_log_path": "/home/app/.pm2/logs/api-out.log",
          "pm_err_log_path": "/home/app/.pm2/logs/api-error.log"
        },
        "monit": { "cpu": 1.5, "memory": 52428800 }
      },
      {
        "pm_id": 1,
        "name": "worker",
        "pm2_env": { "status": "stopped", "pm_uptime": 1699990000000 },
        "monit": { "cpu": 0, "memory": 0 }
      }
    ]"#;

    #[test]
    fn test_parse_json_listing() {
        let records = ServiceListParser::parse_json(JLIST_FIXTURE, fixed_now()).unwrap();
        assert_eq!(records.len(), 2);

        let api = &records[0];
        assert_eq!(api.id, 0);
        assert_eq!(api.name, "api");
        assert_eq!(api.version, "2.1.0");
        assert_eq!(api.status, ServiceStatus::Online);
        assert!((api.cpu_percent - 1.5).abs() < f32::EPSILON);
        assert_eq!(api.memory_bytes, 52_428_800);
        // (1_700_000_000_000 - 1_699_996_400_000) ms = 3600 s
        assert_eq!(api.uptime_secs, 3600);
        assert_eq!(api.port, Some(8080));
        assert_eq!(api.stdout_log_path, "/home/app/.pm2/logs/api-out.log");
        assert!(!api.partial);

        let worker = &records[1];
        assert_eq!(worker.status, ServiceStatus::Stopped);
        // Stopped services report zero uptime regardless of pm_uptime
        assert_eq!(worker.uptime_secs, 0);
        assert_eq!(worker.port, None);
    }

    #[test]
    fn test_parse_json_with_leading_noise() {
        let noisy = format!("[PM2] update available\n{JLIST_FIXTURE}\n");
        let records = ServiceListParser::parse(&noisy, fixed_now()).unwrap();
        assert_eq!(records.len(), 2);

        let empty = "[PM2] daemon started\n[]\n";
        let records = ServiceListParser::parse_json(empty, fixed_now()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_json_missing_fields_flags_partial() {
        let raw = r#"[{ "name": "ghost" }]"#;
        let records = ServiceListParser::parse_json(raw, fixed_now()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].partial);
        assert_eq!(records[0].id, 0);
        assert_eq!(records[0].status, ServiceStatus::Unknown);
        assert_eq!(records[0].memory_bytes, 0);
    }

    #[test]
    fn test_parse_json_garbage_is_error() {
        assert!(ServiceListParser::parse_json("no json here", fixed_now()).is_err());
        assert!(ServiceListParser::parse_json("[ not json ]", fixed_now()).is_err());
    }

    const TABLE_FIXTURE: &str = "\
┌─────┬────────┬─────────┬────────┬───────────┬──────────┬──────────┐
│ id  │ name   │ version │ uptime │ status    │ cpu      │ mem      │
├─────┼────────┼─────────┼────────┼───────────┼──────────┼──────────┤
│ 0   │ api    │ 2.1.0   │ 14D    │ online    │ 0%       │ 512.4mb  │
│ 1   │ worker │ 1.0.3   │ 0      │ stopped   │ 0%       │ 0b       │
└─────┴────────┴─────────┴────────┴───────────┴──────────┴──────────┘
";

    #[test]
    fn test_parse_table() {
        let records = ServiceListParser::parse_table(TABLE_FIXTURE).unwrap();
        assert_eq!(records.len(), 2);

        let api = &records[0];
        assert_eq!(api.id, 0);
        assert_eq!(api.name, "api");
        assert_eq!(api.status, ServiceStatus::Online);
        assert!((api.cpu_percent - 0.0).abs() < f32::EPSILON);
        assert_eq!(api.memory_bytes, 537_290_342); // 512.4 * 1024^2, rounded
        assert_eq!(api.uptime_secs, 14 * 86_400);
        assert!(!api.partial);

        assert_eq!(records[1].status, ServiceStatus::Stopped);
        assert_eq!(records[1].uptime_secs, 0);
    }

    #[test]
    fn test_parse_table_column_order_independent() {
        // Same data with reordered columns, extra whitespace, and an extra
        // column the parser has never seen.
        let reordered = "\
| status  |   mem     | id | watching | cpu  | name   | version | uptime |
| online  | 512.4mb   | 0  | disabled | 0%   | api    | 2.1.0   | 14D    |
| stopped | 0b        | 1  | disabled | 0%   | worker | 1.0.3   | 0      |
";
        let canonical = ServiceListParser::parse_table(TABLE_FIXTURE).unwrap();
        let shuffled = ServiceListParser::parse_table(reordered).unwrap();
        assert_eq!(canonical, shuffled);
    }

    #[test]
    fn test_parse_table_unparseable_cell_is_partial_zero() {
        let raw = "\
| id | name | status | cpu  | mem  | uptime |
| 0  | api  | online | n/a  | ???  | 3h     |
";
        let records = ServiceListParser::parse_table(raw).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].partial);
        assert!((records[0].cpu_percent - 0.0).abs() < f32::EPSILON);
        assert_eq!(records[0].memory_bytes, 0);
        assert_eq!(records[0].uptime_secs, 3 * 3600);
    }

    #[test]
    fn test_parse_table_ignores_noise_rows() {
        let raw = "\
[PM2] Spawning PM2 daemon
| id | name | status | cpu | mem | uptime |
|----|------|--------|-----|-----|--------|
| 0  | api  | online | 1%  | 1mb | 5m     |
Use `pm2 show <id>` to get more details
";
        let records = ServiceListParser::parse_table(raw).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uptime_secs, 300);
    }

    #[test]
    fn test_parse_table_without_header_is_error() {
        assert!(ServiceListParser::parse_table("plain text\nno table\n").is_err());
    }

    #[test]
    fn test_memory_suffix_normalization() {
        assert_eq!(parse_memory_bytes("512.4mb"), Some(537_290_342));
        assert_eq!(parse_memory_bytes("1kb"), Some(1024));
        assert_eq!(parse_memory_bytes("1.5K"), Some(1536));
        assert_eq!(parse_memory_bytes("2gb"), Some(2_147_483_648));
        assert_eq!(parse_memory_bytes("100"), Some(100));
        assert_eq!(parse_memory_bytes("0b"), Some(0));
        assert_eq!(parse_memory_bytes("-5mb"), Some(0));
        assert_eq!(parse_memory_bytes("512,4mb"), Some(537_290_342));
        assert_eq!(parse_memory_bytes("oops"), None);
        assert_eq!(parse_memory_bytes(""), None);
    }

    #[test]
    fn test_cpu_cell_parsing() {
        assert_eq!(parse_cpu_cell("0%"), Some(0.0));
        assert_eq!(parse_cpu_cell(" 12.5% "), Some(12.5));
        assert_eq!(parse_cpu_cell("3,42"), Some(3.42f64 as f32));
        assert_eq!(parse_cpu_cell("-1"), Some(0.0));
        assert_eq!(parse_cpu_cell("n/a"), None);
    }

    #[test]
    fn test_uptime_cell_parsing() {
        assert_eq!(parse_uptime_cell("14D"), Some(14 * 86_400));
        assert_eq!(parse_uptime_cell("2h"), Some(7200));
        assert_eq!(parse_uptime_cell("1d 3h"), Some(86_400 + 3 * 3600));
        assert_eq!(parse_uptime_cell("45s"), Some(45));
        assert_eq!(parse_uptime_cell("90"), Some(90));
        assert_eq!(parse_uptime_cell("soon"), None);
    }

    #[test]
    fn test_cpu_mpstat() {
        assert!((ResourceParser::parse_cpu_mpstat("3.42\n").unwrap() - 3.42).abs() < 0.01);
        // European locale decimal comma
        assert!((ResourceParser::parse_cpu_mpstat("3,42\n").unwrap() - 3.42).abs() < 0.01);
        // First parseable line wins, noise skipped
        let multi = "Linux 6.8.0 (host)\n97.5\n";
        assert!((ResourceParser::parse_cpu_mpstat(multi).unwrap() - 97.5).abs() < 0.01);
        assert!(ResourceParser::parse_cpu_mpstat("no numbers").is_err());
    }

    #[test]
    fn test_cpu_top_fallback() {
        let raw = "%Cpu(s):  3.2 us,  1.0 sy,  0.0 ni, 95.5 id,  0.2 wa,  0.0 hi,  0.1 si";
        let busy = ResourceParser::parse_cpu_top(raw).unwrap();
        assert!((busy - 4.5).abs() < 0.01);

        // Idle above 100 clamps busy to zero rather than going negative
        let odd = "Cpu(s): 100.3 id";
        assert!((ResourceParser::parse_cpu_top(odd).unwrap() - 0.0).abs() < f32::EPSILON);

        assert!(ResourceParser::parse_cpu_top("Cpu(s): busy").is_err());
    }

    #[test]
    fn test_memory_free() {
        let raw = "\
              total        used        free      shared  buff/cache   available
Mem:          15899        8234        1234         456        6431        7102
Swap:          2047           0        2047
";
        let (used, total) = ResourceParser::parse_memory_free(raw).unwrap();
        assert!((used - 8234.0).abs() < f64::EPSILON);
        assert!((total - 15899.0).abs() < f64::EPSILON);

        assert!(ResourceParser::parse_memory_free("Swap: 1 2 3").is_err());
        assert!(ResourceParser::parse_memory_free("Mem: 100").is_err());
    }

    #[test]
    fn test_memory_used_clamped_to_total() {
        let raw = "Mem: 1000 2000 0";
        let (used, total) = ResourceParser::parse_memory_free(raw).unwrap();
        assert!((used - 1000.0).abs() < f64::EPSILON);
        assert!((total - 1000.0).abs() < f64::EPSILON);
    }
}
