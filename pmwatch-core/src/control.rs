//! Control engine: lifecycle mutations through a single worker
//!
//! Control requests flow through a single-consumer queue feeding the one
//! transport session, so they execute in submission order and never
//! interleave with each other. Control takes priority over polling: the
//! pending counter defers timer ticks while work is queued, and the worker
//! requests one immediate poll when the queue drains so the published
//! snapshot reflects the mutation without waiting a full interval.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};

use crate::catalog;
use crate::error::{MonitorError, MonitorResult};
use crate::health::HealthMonitor;
use crate::models::{
    BatchReport, ControlAction, ControlTarget, PendingOperation, Snapshot, TargetOutcome,
};
use crate::settings::MonitorSettings;
use crate::transport::Session;

/// One queued control request
pub(crate) struct ControlRequest {
    pub op: PendingOperation,
    pub cancelled: Arc<AtomicBool>,
    pub reply: oneshot::Sender<MonitorResult<BatchReport>>,
}

/// Everything the control worker needs, wired up by the engine
pub(crate) struct ControlContext {
    pub session: Arc<Session>,
    pub health: Arc<HealthMonitor>,
    pub settings_rx: watch::Receiver<MonitorSettings>,
    pub snapshot_rx: watch::Receiver<Arc<Snapshot>>,
    pub control_pending: Arc<AtomicUsize>,
    pub poll_trigger: mpsc::Sender<()>,
}

/// Spawns the control worker; requests arrive on the returned sender
pub(crate) fn spawn(ctx: ControlContext) -> mpsc::Sender<ControlRequest> {
    let (queue_tx, queue_rx) = mpsc::channel::<ControlRequest>(32);
    tokio::spawn(run(ctx, queue_rx));
    queue_tx
}

async fn run(ctx: ControlContext, mut queue_rx: mpsc::Receiver<ControlRequest>) {
    while let Some(request) = queue_rx.recv().await {
        let result = if request.cancelled.load(Ordering::SeqCst) {
            tracing::debug!(op = %request.op.id, "operation cancelled before dispatch");
            Err(MonitorError::NotFound(format!(
                "operation {} was cancelled before dispatch",
                request.op.id
            )))
        } else {
            execute_operation(&ctx, &request.op).await
        };

        let _ = request.reply.send(result);

        // Once the queue is drained, catch the snapshot up immediately
        // instead of waiting for the next timer tick. This also releases
        // any tick that was deferred while control work was pending.
        if ctx.control_pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = ctx.poll_trigger.try_send(());
        }
    }
}

async fn execute_operation(
    ctx: &ControlContext,
    op: &PendingOperation,
) -> MonitorResult<BatchReport> {
    let timeout = ctx.settings_rx.borrow().command_timeout();
    tracing::info!(op = %op.id, action = %op.action, target = %op.target, "control operation dispatched");

    match &op.target {
        ControlTarget::All => {
            // Fan out per service so the report can attribute each outcome;
            // one failing target never aborts the rest.
            let targets: Vec<(i64, String)> = ctx
                .snapshot_rx
                .borrow()
                .services
                .iter()
                .map(|s| (s.id, s.name.clone()))
                .collect();

            let mut outcomes = Vec::with_capacity(targets.len());
            for (service_id, service_name) in targets {
                let result =
                    run_single(ctx, op.action, &ControlTarget::Id(service_id), timeout).await;
                outcomes.push(TargetOutcome {
                    service_id,
                    service_name,
                    result,
                });
            }
            Ok(BatchReport { outcomes })
        }
        target => {
            let (service_id, service_name) = describe_target(&ctx.snapshot_rx.borrow(), target);
            let result = run_single(ctx, op.action, target, timeout).await;
            Ok(BatchReport {
                outcomes: vec![TargetOutcome {
                    service_id,
                    service_name,
                    result,
                }],
            })
        }
    }
}

/// Resolves the snapshot's view of a single target for reporting purposes
fn describe_target(snapshot: &Snapshot, target: &ControlTarget) -> (i64, String) {
    match target {
        ControlTarget::Id(id) => {
            let name = snapshot
                .service(*id)
                .map(|s| s.name.clone())
                .unwrap_or_default();
            (*id, name)
        }
        ControlTarget::Name(name) => {
            let id = snapshot
                .services
                .iter()
                .find(|s| &s.name == name)
                .map_or(-1, |s| s.id);
            (id, name.clone())
        }
        ControlTarget::All => (-1, "all".to_string()),
    }
}

async fn run_single(
    ctx: &ControlContext,
    action: ControlAction,
    target: &ControlTarget,
    timeout: Duration,
) -> Result<(), MonitorError> {
    let command = catalog::control_command(action, target)?;
    match ctx.session.execute(&command, timeout).await {
        // Exit 0 is success, including the no-op cases the process manager
        // already treats as such (stopping an already-stopped service)
        Ok(output) if output.success() => {
            ctx.health.record_success();
            Ok(())
        }
        Ok(output) => Err(MonitorError::Control {
            exit_code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        }),
        Err(err) => {
            HealthMonitor::observe(&ctx.health, &err);
            Err(err)
        }
    }
}
