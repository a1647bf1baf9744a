//! Poll engine: periodic snapshot collection
//!
//! One background task drives the refresh timer. Each cycle executes the
//! service-list and resource commands through the session, parses the
//! output, and publishes a fresh [`Snapshot`] on a watch channel. The task
//! is the only producer, so polls can never overlap; timer ticks and
//! explicit refresh requests that arrive mid-cycle collapse into at most one
//! follow-up cycle. While control operations are pending the tick is
//! deferred — the control engine requests a poll as soon as its queue
//! drains, so the data catches up right after the mutation instead of
//! racing it.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};

use crate::catalog;
use crate::error::MonitorResult;
use crate::health::HealthMonitor;
use crate::models::{ResourceSample, ServiceRecord, Snapshot};
use crate::parser::{ResourceParser, ServiceListParser};
use crate::settings::MonitorSettings;
use crate::transport::{CommandOutput, Session};

/// Everything the poll task needs, wired up by the engine
pub(crate) struct PollerContext {
    pub session: Arc<Session>,
    pub health: Arc<HealthMonitor>,
    pub settings_rx: watch::Receiver<MonitorSettings>,
    pub control_pending: Arc<AtomicUsize>,
    pub snapshot_tx: watch::Sender<Arc<Snapshot>>,
    pub trigger_rx: mpsc::Receiver<()>,
}

/// Handle to stop the poll task
#[derive(Debug)]
pub(crate) struct PollerHandle {
    stop_tx: mpsc::Sender<()>,
}

impl PollerHandle {
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(()).await;
    }
}

/// Spawns the poll task and returns its handle
pub(crate) fn spawn(ctx: PollerContext) -> PollerHandle {
    let (stop_tx, stop_rx) = mpsc::channel::<()>(1);
    tokio::spawn(run(ctx, stop_rx));
    PollerHandle { stop_tx }
}

async fn run(mut ctx: PollerContext, mut stop_rx: mpsc::Receiver<()>) {
    loop {
        let interval = ctx.settings_rx.borrow().effective_refresh_interval();

        tokio::select! {
            _ = stop_rx.recv() => break,
            changed = ctx.settings_rx.changed() => {
                if changed.is_err() {
                    break; // engine dropped
                }
                // Re-enter the loop so the new interval arms the next tick
            }
            _ = ctx.trigger_rx.recv() => {
                if control_is_pending(&ctx) {
                    continue;
                }
                poll_cycle(&ctx).await;
            }
            () = tick(interval) => {
                if control_is_pending(&ctx) {
                    // Deferred; the control engine triggers a poll when its
                    // queue drains, so this tick is coalesced, not queued
                    tracing::trace!("poll tick deferred behind pending control operation");
                    continue;
                }
                poll_cycle(&ctx).await;
            }
        }
    }
}

fn control_is_pending(ctx: &PollerContext) -> bool {
    ctx.control_pending.load(Ordering::SeqCst) > 0
}

/// Sleeps one refresh interval, or forever when the timer is disabled
async fn tick(interval: Option<Duration>) {
    match interval {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

/// Runs one poll cycle and publishes the resulting snapshot
///
/// Failures never propagate: a failed half carries the previous data with
/// its stale flag set, and connectivity errors are handed to the health
/// monitor.
async fn poll_cycle(ctx: &PollerContext) {
    if !ctx.session.state().is_connected() {
        tracing::trace!("poll skipped, session not connected");
        return;
    }

    let timeout = ctx.settings_rx.borrow().command_timeout();
    let previous = ctx.snapshot_tx.borrow().clone();

    let (services, services_stale) = match fetch_services(&ctx.session, timeout).await {
        Ok(services) => {
            ctx.health.record_success();
            (services, false)
        }
        Err(err) => {
            HealthMonitor::observe(&ctx.health, &err);
            (previous.services.clone(), true)
        }
    };

    let (resources, resources_stale) = match fetch_resources(&ctx.session, timeout).await {
        Ok(sample) => (sample, false),
        Err(err) => {
            HealthMonitor::observe(&ctx.health, &err);
            (previous.resources, true)
        }
    };

    let snapshot = Snapshot {
        timestamp: Utc::now(),
        services,
        resources,
        services_stale,
        resources_stale,
    };
    tracing::debug!(
        services = snapshot.services.len(),
        services_stale,
        resources_stale,
        "snapshot published"
    );
    ctx.snapshot_tx.send_replace(Arc::new(snapshot));
}

/// Whether command output indicates the binary is absent on the remote host
fn reports_missing_command(output: &CommandOutput) -> bool {
    output.exit_code == 127
        || output
            .stderr
            .to_ascii_lowercase()
            .contains("command not found")
}

async fn fetch_services(
    session: &Session,
    timeout: Duration,
) -> MonitorResult<Vec<ServiceRecord>> {
    let output = session.execute(catalog::LIST_SERVICES, timeout).await?;
    if reports_missing_command(&output) {
        session.note_missing_command("pm2");
    }
    ServiceListParser::parse(&output.stdout, Utc::now())
}

async fn fetch_resources(session: &Session, timeout: Duration) -> MonitorResult<ResourceSample> {
    // mpstat is preferred; top is the fallback on hosts without sysstat
    let cpu_percent = {
        let output = session.execute(catalog::CPU_USAGE, timeout).await?;
        if reports_missing_command(&output) {
            session.note_missing_command("mpstat");
        }
        match ResourceParser::parse_cpu_mpstat(&output.stdout) {
            Ok(value) => value,
            Err(_) => {
                let fallback = session.execute(catalog::CPU_USAGE_FALLBACK, timeout).await?;
                ResourceParser::parse_cpu_top(&fallback.stdout)?
            }
        }
    };

    let output = session.execute(catalog::MEMORY_USAGE, timeout).await?;
    if reports_missing_command(&output) {
        session.note_missing_command("free");
    }
    let (used_memory_mb, total_memory_mb) = ResourceParser::parse_memory_free(&output.stdout)?;

    Ok(ResourceSample {
        cpu_percent,
        used_memory_mb,
        total_memory_mb,
    })
}
