//! Data models for remote services, resources, and snapshots
//!
//! All types are GUI-free and serializable so front ends can render or
//! export them without touching the engine internals.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MonitorError;

/// SSH authentication method
#[derive(Clone)]
pub enum AuthMethod {
    /// Password authentication (dispatched via `sshpass`)
    Password(SecretString),
    /// Private-key authentication (`-i` identity file)
    KeyFile(PathBuf),
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password(<redacted>)"),
            Self::KeyFile(path) => write!(f, "KeyFile({})", path.display()),
        }
    }
}

/// Credentials for one SSH session
///
/// Immutable once a session is open; replacing them tears the session down
/// and establishes a new one.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Remote hostname or IP address
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Login user
    pub username: String,
    /// Password or key material
    pub auth: AuthMethod,
}

impl Credentials {
    /// Returns the `user@host` destination string passed to ssh
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

/// Lifecycle state of one supervised service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Process is running
    Online,
    /// Process is stopped
    Stopped,
    /// Process crashed or exhausted its restarts
    Errored,
    /// Status string was missing or unrecognized
    #[default]
    Unknown,
}

impl ServiceStatus {
    /// Maps a raw status string from the process manager to the enum
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "online" | "launching" => Self::Online,
            "stopped" | "stopping" => Self::Stopped,
            "errored" | "error" => Self::Errored,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Stopped => write!(f, "stopped"),
            Self::Errored => write!(f, "errored"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// One supervised service as reported by the process manager
///
/// Produced fresh on every poll; records are never mutated in place — a new
/// snapshot replaces the previous sequence wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Stable numeric id assigned by the process manager
    pub id: i64,
    /// Service name, unique within a snapshot
    pub name: String,
    /// Declared application version, empty when unreported
    #[serde(default)]
    pub version: String,
    /// Lifecycle state
    pub status: ServiceStatus,
    /// CPU usage of the process (percent, >= 0)
    pub cpu_percent: f32,
    /// Resident memory of the process in bytes
    pub memory_bytes: u64,
    /// Seconds since the process started, 0 when stopped
    pub uptime_secs: u64,
    /// Port the service listens on, when exported by its environment
    #[serde(default)]
    pub port: Option<u16>,
    /// Remote path of the stdout log, empty when unknown
    #[serde(default)]
    pub stdout_log_path: String,
    /// Remote path of the stderr log, empty when unknown
    #[serde(default)]
    pub stderr_log_path: String,
    /// True when one or more fields fell back to a zero/unknown value
    #[serde(default)]
    pub partial: bool,
}

/// System-wide resource usage, one per poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceSample {
    /// Aggregate CPU usage (0.0–100.0)
    pub cpu_percent: f32,
    /// Used physical memory in MiB
    pub used_memory_mb: f64,
    /// Total physical memory in MiB (>= used)
    pub total_memory_mb: f64,
}

impl ResourceSample {
    /// Returns memory usage as a percentage (0.0–100.0)
    #[must_use]
    pub fn memory_percent(&self) -> f32 {
        if self.total_memory_mb <= 0.0 {
            return 0.0;
        }
        ((self.used_memory_mb / self.total_memory_mb) * 100.0) as f32
    }
}

/// One consistent, timestamped view of all services plus system resources
///
/// Published atomically as `Arc<Snapshot>`; readers never observe a
/// half-updated snapshot. When half of a poll cycle fails, the failed half
/// carries the previous data flagged stale rather than going blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When this snapshot was assembled
    pub timestamp: DateTime<Utc>,
    /// Ordered service records, as listed by the process manager
    pub services: Vec<ServiceRecord>,
    /// System resource sample
    pub resources: ResourceSample,
    /// True when `services` was carried over from an earlier poll
    pub services_stale: bool,
    /// True when `resources` was carried over from an earlier poll
    pub resources_stale: bool,
}

impl Snapshot {
    /// Returns an empty snapshot used before the first successful poll
    #[must_use]
    pub fn empty() -> Self {
        Self {
            timestamp: Utc::now(),
            services: Vec::new(),
            resources: ResourceSample::default(),
            services_stale: true,
            resources_stale: true,
        }
    }

    /// Looks up a service record by id
    #[must_use]
    pub fn service(&self, id: i64) -> Option<&ServiceRecord> {
        self.services.iter().find(|s| s.id == id)
    }
}

/// Connection lifecycle state of the transport session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No connection established
    #[default]
    Disconnected,
    /// Connection attempt in progress
    Connecting,
    /// Connected, all required remote commands present
    Ready,
    /// Connected, but one or more required remote commands are missing
    Degraded,
    /// Authentication or network setup failed terminally; not retried
    /// automatically
    Failed,
}

impl SessionState {
    /// Whether remote commands may be dispatched in this state
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Ready | Self::Degraded)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Ready => write!(f, "ready"),
            Self::Degraded => write!(f, "degraded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Lifecycle action applied to one or all services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    /// Start a stopped service
    Start,
    /// Stop a running service (no-op on an already-stopped one)
    Stop,
    /// Restart a service
    Restart,
}

impl ControlAction {
    /// Returns the process-manager subcommand for this action
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }
}

impl std::fmt::Display for ControlAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of a control operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlTarget {
    /// A single service addressed by numeric id
    Id(i64),
    /// A single service addressed by name
    Name(String),
    /// Every service known to the process manager
    All,
}

impl std::fmt::Display for ControlTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
            Self::All => f.write_str("all"),
        }
    }
}

/// A queued control request, visible from submission until completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    /// Unique id for cancellation and tracking
    pub id: Uuid,
    /// Target service(s)
    pub target: ControlTarget,
    /// Requested action
    pub action: ControlAction,
}

/// Outcome of a control action against one target
#[derive(Debug, Clone, PartialEq)]
pub struct TargetOutcome {
    /// Service id the action was applied to
    pub service_id: i64,
    /// Service name at the time of submission
    pub service_name: String,
    /// Per-target result; `Err` carries the remote stderr
    pub result: Result<(), MonitorError>,
}

/// Result set of a (possibly batched) control operation
///
/// Batch operations never abort on a failing target; the report records
/// which targets succeeded and which failed and why.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    /// One outcome per target, in execution order
    pub outcomes: Vec<TargetOutcome>,
}

impl BatchReport {
    /// Number of targets that succeeded
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of targets that failed
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Whether every target succeeded (an empty report counts as success)
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Which log stream of a service to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    /// The service's stdout log file
    Stdout,
    /// The service's stderr log file
    Stderr,
}

/// A tail of one service log, newest line last
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogChunk {
    /// Service the log belongs to
    pub service_id: i64,
    /// Which stream was read
    pub stream: LogStream,
    /// Ordered text lines, newest last
    pub lines: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_raw() {
        assert_eq!(ServiceStatus::from_raw("online"), ServiceStatus::Online);
        assert_eq!(ServiceStatus::from_raw(" Online "), ServiceStatus::Online);
        assert_eq!(ServiceStatus::from_raw("stopped"), ServiceStatus::Stopped);
        assert_eq!(ServiceStatus::from_raw("errored"), ServiceStatus::Errored);
        assert_eq!(ServiceStatus::from_raw("waiting"), ServiceStatus::Unknown);
        assert_eq!(ServiceStatus::from_raw(""), ServiceStatus::Unknown);
    }

    #[test]
    fn test_memory_percent() {
        let sample = ResourceSample {
            cpu_percent: 10.0,
            used_memory_mb: 2048.0,
            total_memory_mb: 8192.0,
        };
        assert!((sample.memory_percent() - 25.0).abs() < 0.01);

        let zero = ResourceSample::default();
        assert!((zero.memory_percent() - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_batch_report_counts() {
        let report = BatchReport {
            outcomes: vec![
                TargetOutcome {
                    service_id: 0,
                    service_name: "api".into(),
                    result: Ok(()),
                },
                TargetOutcome {
                    service_id: 1,
                    service_name: "worker".into(),
                    result: Err(MonitorError::Control {
                        exit_code: 1,
                        stderr: "script not found".into(),
                    }),
                },
            ],
        };
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        assert!(BatchReport::default().is_success());
    }

    #[test]
    fn test_auth_debug_redacts_password() {
        let auth = AuthMethod::Password(SecretString::from("hunter2"));
        let formatted = format!("{auth:?}");
        assert!(!formatted.contains("hunter2"));
        assert!(formatted.contains("redacted"));
    }

    #[test]
    fn test_snapshot_lookup() {
        let mut snapshot = Snapshot::empty();
        snapshot.services.push(ServiceRecord {
            id: 3,
            name: "api".into(),
            version: String::new(),
            status: ServiceStatus::Online,
            cpu_percent: 0.0,
            memory_bytes: 0,
            uptime_secs: 0,
            port: None,
            stdout_log_path: String::new(),
            stderr_log_path: String::new(),
            partial: false,
        });
        assert!(snapshot.service(3).is_some());
        assert!(snapshot.service(4).is_none());
    }
}
