//! Error types for the monitoring and control engine

use thiserror::Error;

/// Error type for all engine operations
///
/// Transport and parse failures that occur during polling are absorbed into
/// stale-flagged snapshots by the poll engine; the variants here surface on
/// the control path, the log path, and the session lifecycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// The remote host rejected the provided credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The remote host could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// No response from the remote host within the allotted time
    #[error("Command timed out after {0}s")]
    Timeout(u64),

    /// The SSH channel dropped while a command was in flight
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Remote output could not be parsed into the expected shape
    #[error("Failed to parse remote output: {0}")]
    Parse(String),

    /// A service identifier contained shell metacharacters
    #[error("Invalid identifier {0:?}")]
    InvalidIdentifier(String),

    /// The remote process manager reported a failure
    #[error("Control command failed (exit {exit_code}): {stderr}")]
    Control {
        /// Exit code reported by the remote command
        exit_code: i32,
        /// Captured stderr of the remote command, trimmed
        stderr: String,
    },

    /// The session is disconnected or has failed; no command was dispatched
    #[error("Not connected")]
    NotConnected,

    /// The requested service or log file does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl MonitorError {
    /// Whether this error indicates the transport itself is unhealthy
    ///
    /// Connectivity errors drive the session state machine; everything else
    /// (parse noise, bad identifiers, remote-reported failures) does not.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::ConnectionLost(_)
        )
    }
}

/// Result type alias for engine operations
pub type MonitorResult<T> = Result<T, MonitorError>;
