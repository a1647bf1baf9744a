//! Run an arbitrary command over the session.

use pmwatch_core::MonitorError;

use crate::cli::Cli;
use crate::error::CliError;

use super::connect_monitor;

/// Exec command handler: a raw pass-through outside the structured model
pub async fn cmd_exec(cli: &Cli, command: &[String]) -> Result<(), CliError> {
    let command = command.join(" ");
    if command.trim().is_empty() {
        return Err(CliError::Usage("empty command".into()));
    }

    let monitor = connect_monitor(cli, 0).await?;
    let output = monitor.run_command(&command).await?;
    monitor.close().await;

    if !cli.quiet {
        print!("{}", output.stdout);
        eprint!("{}", output.stderr);
    }

    if output.success() {
        Ok(())
    } else {
        Err(CliError::Monitor(MonitorError::Control {
            exit_code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        }))
    }
}
