//! Show remote system resources.

use crate::cli::Cli;
use crate::error::CliError;
use crate::format::resource_line;

use super::{connect_monitor, wait_for_snapshot};

/// Resources command handler
pub async fn cmd_resources(cli: &Cli) -> Result<(), CliError> {
    let monitor = connect_monitor(cli, 0).await?;
    let snapshot = wait_for_snapshot(cli, &monitor).await?;
    monitor.close().await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot.resources)
                .map_err(|e| CliError::Usage(format!("failed to encode resources: {e}")))?
        );
    } else if !cli.quiet {
        println!(
            "{}",
            resource_line(&snapshot.resources, snapshot.resources_stale)
        );
    }
    Ok(())
}
