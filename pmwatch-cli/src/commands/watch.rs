//! Poll continuously and print each snapshot.

use crate::cli::Cli;
use crate::error::CliError;
use crate::format::snapshot_text;

use super::connect_monitor;

/// Watch command handler
pub async fn cmd_watch(cli: &Cli, interval: u32, count: Option<u32>) -> Result<(), CliError> {
    let monitor = connect_monitor(cli, interval.max(1)).await?;
    let mut rx = monitor.subscribe();

    let mut printed: u32 = 0;
    loop {
        if rx.changed().await.is_err() {
            break;
        }
        let snapshot = rx.borrow_and_update().clone();

        if cli.json {
            match serde_json::to_string(&*snapshot) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "failed to encode snapshot"),
            }
        } else if !cli.quiet {
            print!("{}", snapshot_text(&snapshot));
            println!();
        }

        printed += 1;
        if count.is_some_and(|limit| printed >= limit) {
            break;
        }
    }

    monitor.close().await;
    Ok(())
}
