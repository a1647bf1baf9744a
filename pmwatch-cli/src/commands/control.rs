//! Start, stop, and restart services.

use pmwatch_core::{ControlAction, ControlTarget};

use crate::cli::Cli;
use crate::error::CliError;

use super::{connect_monitor, parse_target, wait_for_snapshot};

/// Control command handler shared by start/stop/restart
pub async fn cmd_control(cli: &Cli, action: &str, raw_target: &str) -> Result<(), CliError> {
    let action = match action {
        "start" => ControlAction::Start,
        "stop" => ControlAction::Stop,
        _ => ControlAction::Restart,
    };
    let target = parse_target(raw_target);

    let monitor = connect_monitor(cli, 0).await?;
    // Batch targets and name lookups resolve against the current snapshot
    wait_for_snapshot(cli, &monitor).await?;

    let report = monitor.control(action, target.clone()).await?;
    monitor.close().await;

    if !cli.quiet {
        for outcome in &report.outcomes {
            let label = if outcome.service_name.is_empty() {
                outcome.service_id.to_string()
            } else {
                outcome.service_name.clone()
            };
            match &outcome.result {
                Ok(()) => println!("{action} {label}: ok"),
                Err(err) => println!("{action} {label}: failed ({err})"),
            }
        }
    }

    if report.is_success() {
        Ok(())
    } else if matches!(target, ControlTarget::All) {
        Err(CliError::PartialFailure {
            failed: report.failed(),
            total: report.outcomes.len(),
        })
    } else {
        // Single target: surface the underlying engine error directly
        let err = report
            .outcomes
            .into_iter()
            .find_map(|o| o.result.err())
            .unwrap_or(pmwatch_core::MonitorError::NotConnected);
        Err(CliError::Monitor(err))
    }
}
