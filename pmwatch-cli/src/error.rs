//! CLI error types and exit codes.

use pmwatch_core::MonitorError;

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - usage, validation, or remote-reported failures
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - the session could not be established or was lost
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Invalid or missing command-line input
    #[error("Usage error: {0}")]
    Usage(String),

    /// Failure reported by the monitoring engine
    #[error("{0}")]
    Monitor(#[from] MonitorError),

    /// One or more targets of a batch operation failed
    #[error("{failed} of {total} targets failed")]
    PartialFailure {
        /// Number of failed targets
        failed: usize,
        /// Total number of targets
        total: usize,
    },
}

impl CliError {
    /// Maps the error to a process exit code
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Monitor(err) if err.is_connectivity() => exit_codes::CONNECTION_FAILURE,
            Self::Monitor(
                MonitorError::Auth(_) | MonitorError::NotConnected,
            ) => exit_codes::CONNECTION_FAILURE,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::Usage("missing host".into()).exit_code(),
            exit_codes::GENERAL_ERROR
        );
        assert_eq!(
            CliError::Monitor(MonitorError::Network("unreachable".into())).exit_code(),
            exit_codes::CONNECTION_FAILURE
        );
        assert_eq!(
            CliError::Monitor(MonitorError::Auth("denied".into())).exit_code(),
            exit_codes::CONNECTION_FAILURE
        );
        assert_eq!(
            CliError::Monitor(MonitorError::Control {
                exit_code: 1,
                stderr: "not found".into()
            })
            .exit_code(),
            exit_codes::GENERAL_ERROR
        );
    }
}
