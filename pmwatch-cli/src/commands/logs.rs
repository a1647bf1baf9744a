//! Fetch service log tails.

use pmwatch_core::LogStream;

use crate::cli::{Cli, StreamArg};
use crate::error::CliError;

use super::{connect_monitor, wait_for_snapshot};

/// Logs command handler
pub async fn cmd_logs(
    cli: &Cli,
    service: i64,
    stream: StreamArg,
    lines: u32,
) -> Result<(), CliError> {
    let stream = match stream {
        StreamArg::Stdout => LogStream::Stdout,
        StreamArg::Stderr => LogStream::Stderr,
    };

    let monitor = connect_monitor(cli, 0).await?;
    // Log paths come from the service records of the latest snapshot
    wait_for_snapshot(cli, &monitor).await?;

    let chunk = monitor.fetch_log_tail(service, stream, Some(lines)).await?;
    monitor.close().await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&chunk)
                .map_err(|e| CliError::Usage(format!("failed to encode log chunk: {e}")))?
        );
    } else if !cli.quiet {
        for line in &chunk.lines {
            println!("{line}");
        }
    }
    Ok(())
}
