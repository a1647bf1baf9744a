//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// PMWatch command-line interface for supervising remote PM2 services
#[derive(Parser)]
#[command(name = "pmwatch")]
#[command(author, version, about = "Supervise PM2 services on a remote host over SSH")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Remote host to connect to
    #[arg(short = 'H', long, global = true, env = "PMWATCH_HOST", default_value = "")]
    pub host: String,

    /// SSH port
    #[arg(short, long, global = true, env = "PMWATCH_PORT", default_value_t = 22)]
    pub port: u16,

    /// SSH username
    #[arg(short, long, global = true, env = "PMWATCH_USER", default_value = "")]
    pub user: String,

    /// Path to an SSH private key; password authentication is used when
    /// omitted (PMWATCH_PASSWORD or an interactive prompt)
    #[arg(short, long, global = true, env = "PMWATCH_IDENTITY")]
    pub identity: Option<PathBuf>,

    /// Per-command execution timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,

    /// Output as JSON instead of a table
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which log stream to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StreamArg {
    /// The service's stdout log
    Stdout,
    /// The service's stderr log
    Stderr,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List the supervised services with status and resource usage
    #[command(about = "List supervised services")]
    List,

    /// Show system CPU and memory usage of the remote host
    #[command(about = "Show remote system resources")]
    Resources,

    /// Start a service (by id or name) or all services
    #[command(about = "Start one service or all of them")]
    Start {
        /// Service id, service name, or "all"
        target: String,
    },

    /// Stop a service (by id or name) or all services
    #[command(about = "Stop one service or all of them")]
    Stop {
        /// Service id, service name, or "all"
        target: String,
    },

    /// Restart a service (by id or name) or all services
    #[command(about = "Restart one service or all of them")]
    Restart {
        /// Service id, service name, or "all"
        target: String,
    },

    /// Fetch the tail of a service log
    #[command(about = "Fetch the tail of a service log")]
    Logs {
        /// Service id
        service: i64,

        /// Which log stream to read
        #[arg(short, long, value_enum, default_value = "stdout")]
        stream: StreamArg,

        /// Number of lines to fetch
        #[arg(short = 'n', long, default_value_t = 100)]
        lines: u32,
    },

    /// Run an arbitrary command on the remote host
    #[command(about = "Run a raw command over the session")]
    Exec {
        /// Command line to execute remotely
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },

    /// Poll continuously and print each snapshot
    #[command(about = "Poll continuously and print snapshots")]
    Watch {
        /// Refresh interval in seconds
        #[arg(long, default_value_t = 5)]
        interval: u32,

        /// Stop after this many snapshots (run forever when omitted)
        #[arg(short, long)]
        count: Option<u32>,
    },
}
