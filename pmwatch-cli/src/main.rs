//! PMWatch CLI - supervise PM2 services on a remote host over SSH
//!
//! Provides commands for listing services, inspecting system resources,
//! controlling service lifecycles, fetching log tails, running ad-hoc
//! commands, and continuous watching.

mod cli;
mod commands;
mod error;
mod format;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let quiet = cli.quiet;
    let result = commands::dispatch(cli).await;

    if let Err(e) = result {
        if !quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
