//! PMWatch Core Library
//!
//! Remote supervision engine for processes managed by PM2 on a host
//! reachable only over SSH: service status, resource usage, log tails, and
//! lifecycle control, with no agent on the target. One [`engine::Monitor`]
//! owns one authenticated session, polls the remote process manager and OS
//! utilities on a timer, parses their output into typed snapshots, and
//! serializes every remote command behind a single mutual-exclusion point.
//!
//! # Crate Structure
//!
//! - [`models`] - Core data structures (ServiceRecord, Snapshot, Credentials)
//! - [`engine`] - The [`engine::Monitor`] orchestrator front ends talk to
//! - [`transport`] - SSH transport and the serialized session wrapper
//! - [`catalog`] - Remote command strings and identifier validation
//! - [`parser`] - Pure text parsers for process-manager and OS output
//! - `poll` / `control` - Background polling and lifecycle mutations
//! - [`health`] - Failure classification and backoff reconnection
//! - [`settings`] - Runtime-tunable engine settings
//! - [`testing`] - Scripted transport for tests
//!
//! The presentation layer, configuration persistence, and translations are
//! deliberately outside this crate; they consume snapshots and submit
//! requests through the engine API.

#![warn(missing_docs)]

pub mod catalog;
mod control;
pub mod engine;
pub mod error;
pub mod health;
pub mod models;
pub mod parser;
mod poll;
pub mod settings;
pub mod testing;
pub mod transport;

pub use engine::Monitor;
pub use error::{MonitorError, MonitorResult};
pub use health::RetryConfig;
pub use models::{
    AuthMethod, BatchReport, ControlAction, ControlTarget, Credentials, LogChunk, LogStream,
    PendingOperation, ResourceSample, ServiceRecord, ServiceStatus, SessionState, Snapshot,
    TargetOutcome,
};
pub use settings::MonitorSettings;
pub use transport::{CommandOutput, Session, SshTransport, Transport};
