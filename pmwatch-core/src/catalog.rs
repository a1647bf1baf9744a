//! Command catalog: logical operations mapped to remote shell commands
//!
//! Pure and stateless. Every command string dispatched to the transport is
//! produced here, and every caller-supplied parameter (service name, log
//! path) is validated against shell metacharacters before it is interpolated,
//! so nothing user-editable can smuggle extra shell syntax to the remote
//! host.

use crate::error::{MonitorError, MonitorResult};
use crate::models::{ControlAction, ControlTarget};

/// Remote commands the engine depends on, probed at connect time
pub const REQUIRED_COMMANDS: &[&str] = &["pm2", "mpstat", "free", "top", "awk", "grep", "tail"];

/// Lists all managed processes as a JSON array
pub const LIST_SERVICES: &str = "pm2 jlist";

/// Lists all managed processes as a human-readable table
///
/// Fallback source when the JSON listing cannot be parsed.
pub const LIST_SERVICES_TABLE: &str = "pm2 list";

/// Samples aggregate CPU usage over one second via mpstat
pub const CPU_USAGE: &str = "mpstat 1 1 | awk '/Average/ {print 100 - $12}'";

/// CPU usage fallback for hosts without mpstat
pub const CPU_USAGE_FALLBACK: &str = "top -bn1 | grep -i \"Cpu(s)\"";

/// Reports system memory in mebibytes
pub const MEMORY_USAGE: &str = "free -m";

/// Builds the probe that prints each missing required command on its own line
#[must_use]
pub fn probe_required_commands() -> String {
    let names = REQUIRED_COMMANDS.join(" ");
    format!("for c in {names}; do command -v \"$c\" >/dev/null 2>&1 || echo \"$c\"; done")
}

/// Parses probe output into the list of missing command names
#[must_use]
pub fn parse_probe_output(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| REQUIRED_COMMANDS.contains(line))
        .map(ToString::to_string)
        .collect()
}

/// Builds the lifecycle command for one target
///
/// # Errors
///
/// Returns [`MonitorError::InvalidIdentifier`] when a name target contains
/// characters outside the process manager's safe identifier set.
pub fn control_command(action: ControlAction, target: &ControlTarget) -> MonitorResult<String> {
    let target_arg = match target {
        ControlTarget::Id(id) => id.to_string(),
        ControlTarget::Name(name) => {
            validate_identifier(name)?;
            name.clone()
        }
        ControlTarget::All => "all".to_string(),
    };
    Ok(format!("pm2 {} {}", action.as_str(), target_arg))
}

/// Builds the log tail command for one log file
///
/// # Errors
///
/// Returns [`MonitorError::InvalidIdentifier`] when the path contains
/// characters that would escape the quoting.
pub fn log_tail_command(path: &str, lines: u32) -> MonitorResult<String> {
    validate_log_path(path)?;
    Ok(format!("tail -n {lines} \"{path}\""))
}

/// Validates a service name against the safe identifier set
///
/// Process-manager service names are restricted to ASCII alphanumerics plus
/// `.`, `_` and `-`; anything else (whitespace, quoting, `;`, `$`, …) is
/// rejected before it can reach the transport.
///
/// # Errors
///
/// Returns [`MonitorError::InvalidIdentifier`] for an empty, oversized, or
/// unsafe name.
pub fn validate_identifier(name: &str) -> MonitorResult<()> {
    if name.is_empty() || name.len() > 128 {
        return Err(MonitorError::InvalidIdentifier(name.to_string()));
    }
    let safe = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if safe {
        Ok(())
    } else {
        Err(MonitorError::InvalidIdentifier(name.to_string()))
    }
}

/// Validates a remote log path before it is double-quoted into a command
///
/// Paths come from process-manager output rather than user input, but they
/// still pass through a shell; spaces are fine inside the quotes, the
/// quote-breaking and substitution characters are not.
///
/// # Errors
///
/// Returns [`MonitorError::InvalidIdentifier`] for an empty, relative, or
/// unsafe path.
pub fn validate_log_path(path: &str) -> MonitorResult<()> {
    if path.is_empty() || path.len() > 1024 || !path.starts_with('/') {
        return Err(MonitorError::InvalidIdentifier(path.to_string()));
    }
    let safe = path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/' | ' ' | '+' | ':'));
    if safe {
        Ok(())
    } else {
        Err(MonitorError::InvalidIdentifier(path.to_string()))
    }
}
