//! List supervised services.

use crate::cli::Cli;
use crate::error::CliError;
use crate::format::snapshot_text;

use super::{connect_monitor, wait_for_snapshot};

/// List command handler
pub async fn cmd_list(cli: &Cli) -> Result<(), CliError> {
    let monitor = connect_monitor(cli, 0).await?;
    let snapshot = wait_for_snapshot(cli, &monitor).await?;
    monitor.close().await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&*snapshot)
                .map_err(|e| CliError::Usage(format!("failed to encode snapshot: {e}")))?
        );
    } else if !cli.quiet {
        print!("{}", snapshot_text(&snapshot));
    }
    Ok(())
}
