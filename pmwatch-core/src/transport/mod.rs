//! Transport layer: the single remote session all commands flow through
//!
//! The engine never touches a raw SSH channel. Everything goes through the
//! [`Transport`] trait (so tests can substitute a mock) and the [`Session`]
//! wrapper (which serializes command dispatch and tracks connection state).

pub mod session;
pub mod ssh;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::MonitorResult;

pub use session::Session;
pub use ssh::SshTransport;

/// Captured result of one remote command execution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Remote exit code (-1 when terminated by a signal)
    pub exit_code: i32,
}

impl CommandOutput {
    /// Whether the remote command exited with status 0
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// An authenticated channel to the remote host
///
/// Implementations own exactly one logical session. `execute` returns `Ok`
/// with the captured output even when the remote command exits nonzero;
/// `Err` is reserved for transport-level failures (unreachable host, dropped
/// channel, timeout).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establishes (or re-establishes) the authenticated session
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MonitorError::Auth`] on rejected credentials
    /// and [`crate::error::MonitorError::Network`] when the host is
    /// unreachable within `timeout`.
    async fn connect(&self, timeout: Duration) -> MonitorResult<()>;

    /// Executes one command and captures its output
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MonitorError::Timeout`] when no response
    /// arrives within `timeout` and
    /// [`crate::error::MonitorError::ConnectionLost`] when the channel drops
    /// mid-call.
    async fn execute(&self, command: &str, timeout: Duration) -> MonitorResult<CommandOutput>;

    /// Releases the session; safe to call repeatedly
    async fn close(&self);
}
