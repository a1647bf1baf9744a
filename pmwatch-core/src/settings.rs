//! Engine settings supplied by the embedding application
//!
//! The configuration provider (GUI preferences, CLI flags) owns persistence;
//! the engine only consumes these values and accepts updates at runtime
//! through [`crate::engine::Monitor::update_settings`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::health::RetryConfig;

/// Default auto-refresh interval in seconds
pub const DEFAULT_REFRESH_INTERVAL_SECS: u32 = 30;

/// Default per-command execution timeout in seconds
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default number of log lines fetched by a tail request
pub const DEFAULT_LOG_TAIL_LINES: u32 = 100;

/// Runtime settings for the monitoring engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Auto-refresh interval in seconds; 0 disables the timer entirely
    /// (polls then only happen on explicit request)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u32,
    /// Timeout for a single remote command execution in seconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
    /// Timeout for establishing the SSH session in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Default line count for log tail requests
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: u32,
    /// Reconnection policy applied after connectivity failures
    #[serde(default)]
    pub retry: RetryConfig,
}

const fn default_refresh_interval() -> u32 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

const fn default_command_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

const fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

const fn default_log_tail_lines() -> u32 {
    DEFAULT_LOG_TAIL_LINES
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            log_tail_lines: DEFAULT_LOG_TAIL_LINES,
            retry: RetryConfig::default(),
        }
    }
}

impl MonitorSettings {
    /// Returns the auto-refresh interval, or `None` when disabled
    ///
    /// Enabled intervals are clamped to 1–3600 seconds.
    #[must_use]
    pub fn effective_refresh_interval(&self) -> Option<Duration> {
        if self.refresh_interval_secs == 0 {
            return None;
        }
        Some(Duration::from_secs(u64::from(
            self.refresh_interval_secs.clamp(1, 3600),
        )))
    }

    /// Per-command execution timeout, clamped to 1–600 seconds
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.clamp(1, 600))
    }

    /// Session connect timeout, clamped to 1–120 seconds
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.clamp(1, 120))
    }

    /// Log tail line count, clamped to 1–10000
    #[must_use]
    pub fn effective_log_tail_lines(&self) -> u32 {
        self.log_tail_lines.clamp(1, 10_000)
    }
}
