//! SSH transport built on the system ssh client
//!
//! Commands run through `ssh` (or `sshpass -e ssh` for password
//! authentication). An OpenSSH ControlMaster socket keeps one authenticated
//! connection alive; individual command dispatches multiplex over it instead
//! of paying a handshake each time. This keeps the engine free of any SSH
//! protocol code and inherits the user's ssh configuration.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::process::Command;
use uuid::Uuid;

use super::{CommandOutput, Transport};
use crate::error::{MonitorError, MonitorResult};
use crate::models::{AuthMethod, Credentials};

/// How long the master connection stays alive with no channels (seconds)
const CONTROL_PERSIST_SECS: u32 = 600;

/// SSH transport for one remote host
#[derive(Debug)]
pub struct SshTransport {
    credentials: Credentials,
    control_path: PathBuf,
    use_sshpass: bool,
}

impl SshTransport {
    /// Creates a transport for the given credentials
    ///
    /// Password authentication requires `sshpass` on the local host; its
    /// availability is checked once here so `connect` can fail fast with a
    /// clear message instead of hanging on an interactive prompt.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        let use_sshpass = matches!(credentials.auth, AuthMethod::Password(_))
            && std::process::Command::new("sshpass")
                .arg("-V")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok();

        let control_path =
            std::env::temp_dir().join(format!("pmwatch-{}.ctl", Uuid::new_v4().simple()));

        Self {
            credentials,
            control_path,
            use_sshpass,
        }
    }

    /// Builds an ssh invocation with the session options applied
    fn ssh_command(&self) -> Command {
        let mut cmd;
        match &self.credentials.auth {
            AuthMethod::Password(password) if self.use_sshpass => {
                cmd = Command::new("sshpass");
                cmd.arg("-e").arg("ssh");
                // sshpass reads the secret from SSHPASS with -e; it never
                // appears on the command line
                cmd.env("SSHPASS", password.expose_secret());
            }
            AuthMethod::Password(_) => {
                // No sshpass available; BatchMode turns the interactive
                // prompt into an immediate, classifiable failure
                cmd = Command::new("ssh");
                cmd.arg("-o").arg("BatchMode=yes");
            }
            AuthMethod::KeyFile(path) => {
                cmd = Command::new("ssh");
                cmd.arg("-o").arg("BatchMode=yes");
                let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
                cmd.arg("-i").arg(expanded);
            }
        }

        cmd.arg("-o").arg("StrictHostKeyChecking=no");
        cmd.arg("-o").arg("ControlMaster=auto");
        cmd.arg("-o")
            .arg(format!("ControlPath={}", self.control_path.display()));
        cmd.arg("-o")
            .arg(format!("ControlPersist={CONTROL_PERSIST_SECS}"));

        if self.credentials.port != 22 {
            cmd.arg("-p").arg(self.credentials.port.to_string());
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }

    /// Whether stderr from an exit-255 ssh process points at the transport
    /// rather than the remote command
    fn is_transport_failure(stderr: &str) -> bool {
        let s = stderr.to_ascii_lowercase();
        s.contains("connection closed")
            || s.contains("connection refused")
            || s.contains("connection reset")
            || s.contains("connection timed out")
            || s.contains("broken pipe")
            || s.contains("ssh:")
            || s.contains("control socket")
    }

    fn is_auth_failure(stderr: &str) -> bool {
        let s = stderr.to_ascii_lowercase();
        s.contains("permission denied")
            || s.contains("authentication failed")
            || s.contains("too many authentication failures")
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn connect(&self, timeout: Duration) -> MonitorResult<()> {
        let mut cmd = self.ssh_command();
        cmd.arg("-o")
            .arg(format!("ConnectTimeout={}", timeout.as_secs().max(1)));
        cmd.arg(self.credentials.destination());
        cmd.arg("true");

        // The outer timeout covers DNS, TCP, and authentication together;
        // ConnectTimeout alone only bounds the TCP stage.
        let grace = timeout + Duration::from_secs(5);
        let output = match tokio::time::timeout(grace, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(MonitorError::Network(format!("failed to spawn ssh: {e}")));
            }
            Err(_) => {
                return Err(MonitorError::Network(format!(
                    "connection attempt timed out after {}s",
                    grace.as_secs()
                )));
            }
        };

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if Self::is_auth_failure(&stderr) {
            Err(MonitorError::Auth(stderr))
        } else {
            Err(MonitorError::Network(stderr))
        }
    }

    async fn execute(&self, command: &str, timeout: Duration) -> MonitorResult<CommandOutput> {
        let mut cmd = self.ssh_command();
        cmd.arg(self.credentials.destination());
        cmd.arg(command);

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(MonitorError::Network(format!("failed to spawn ssh: {e}")));
            }
            Err(_) => return Err(MonitorError::Timeout(timeout.as_secs())),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = output.status.code().unwrap_or(-1);

        // ssh reserves 255 for its own failures, but a remote command may
        // legitimately exit 255 too; only treat it as a dropped channel when
        // stderr carries an ssh-level message.
        if exit_code == 255 && Self::is_transport_failure(&stderr) {
            return Err(MonitorError::ConnectionLost(stderr.trim().to_string()));
        }

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code,
        })
    }

    async fn close(&self) {
        // Ask the master connection to exit; harmless when already gone
        let mut cmd = Command::new("ssh");
        cmd.arg("-o")
            .arg(format!("ControlPath={}", self.control_path.display()));
        cmd.arg("-O").arg("exit");
        cmd.arg(self.credentials.destination());
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        cmd.kill_on_drop(true);

        if let Ok(result) = tokio::time::timeout(Duration::from_secs(5), cmd.output()).await {
            if let Err(e) = result {
                tracing::debug!(error = %e, "failed to stop ssh control master");
            }
        }
    }
}
