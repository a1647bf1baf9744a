//! Command handler modules for the CLI.

mod control;
mod exec;
mod list;
mod logs;
mod resources;
mod watch;

use std::sync::Arc;
use std::time::Duration;

use pmwatch_core::{
    AuthMethod, ControlTarget, Credentials, Monitor, MonitorError, MonitorSettings, Snapshot,
};
use secrecy::SecretString;

use crate::cli::{Cli, Commands};
use crate::error::CliError;

/// Dispatch a CLI command to the appropriate handler.
pub async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match &cli.command {
        Commands::List => list::cmd_list(&cli).await,
        Commands::Resources => resources::cmd_resources(&cli).await,
        Commands::Start { target } => control::cmd_control(&cli, "start", target).await,
        Commands::Stop { target } => control::cmd_control(&cli, "stop", target).await,
        Commands::Restart { target } => control::cmd_control(&cli, "restart", target).await,
        Commands::Logs {
            service,
            stream,
            lines,
        } => logs::cmd_logs(&cli, *service, *stream, *lines).await,
        Commands::Exec { command } => exec::cmd_exec(&cli, command).await,
        Commands::Watch { interval, count } => watch::cmd_watch(&cli, *interval, *count).await,
    }
}

/// Builds credentials from CLI flags, prompting for a password when needed.
fn build_credentials(cli: &Cli) -> Result<Credentials, CliError> {
    if cli.host.is_empty() {
        return Err(CliError::Usage(
            "no host given (use --host or PMWATCH_HOST)".into(),
        ));
    }
    if cli.user.is_empty() {
        return Err(CliError::Usage(
            "no username given (use --user or PMWATCH_USER)".into(),
        ));
    }

    let auth = if let Some(identity) = &cli.identity {
        AuthMethod::KeyFile(identity.clone())
    } else if let Ok(password) = std::env::var("PMWATCH_PASSWORD") {
        AuthMethod::Password(SecretString::from(password))
    } else {
        let prompt = format!("Password for {}@{}: ", cli.user, cli.host);
        let password = rpassword::prompt_password(prompt)
            .map_err(|e| CliError::Usage(format!("failed to read password: {e}")))?;
        AuthMethod::Password(SecretString::from(password))
    };

    Ok(Credentials {
        host: cli.host.clone(),
        port: cli.port,
        username: cli.user.clone(),
        auth,
    })
}

/// Creates and connects a monitor; `refresh_interval_secs` of 0 disables the
/// background timer for one-shot commands.
pub(crate) async fn connect_monitor(
    cli: &Cli,
    refresh_interval_secs: u32,
) -> Result<Monitor, CliError> {
    let credentials = build_credentials(cli)?;
    let settings = MonitorSettings {
        refresh_interval_secs,
        command_timeout_secs: cli.timeout,
        ..Default::default()
    };

    let monitor = Monitor::new(credentials, settings);
    let state = monitor.connect().await?;
    tracing::info!(%state, host = %cli.host, "session established");

    let missing = monitor.missing_commands();
    if !missing.is_empty() && !cli.quiet {
        eprintln!(
            "Warning: remote host is missing required commands: {}",
            missing.join(", ")
        );
    }

    Ok(monitor)
}

/// Waits for the first freshly polled snapshot after connect.
pub(crate) async fn wait_for_snapshot(
    cli: &Cli,
    monitor: &Monitor,
) -> Result<Arc<Snapshot>, CliError> {
    let mut rx = monitor.subscribe();
    let deadline = Duration::from_secs(cli.timeout.saturating_mul(4).max(10));
    tokio::time::timeout(deadline, rx.changed())
        .await
        .map_err(|_| CliError::Monitor(MonitorError::Timeout(deadline.as_secs())))?
        .map_err(|_| CliError::Monitor(MonitorError::NotConnected))?;
    let snapshot = rx.borrow().clone();
    Ok(snapshot)
}

/// Parses a CLI target string: "all", a numeric id, or a service name.
pub(crate) fn parse_target(raw: &str) -> ControlTarget {
    if raw.eq_ignore_ascii_case("all") {
        ControlTarget::All
    } else if let Ok(id) = raw.parse::<i64>() {
        ControlTarget::Id(id)
    } else {
        ControlTarget::Name(raw.to_string())
    }
}
