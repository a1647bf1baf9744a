//! Engine orchestration: one [`Monitor`] per remote host
//!
//! The monitor wires the session, poll engine, control engine, and health
//! monitor together and is the only type front ends need to touch. Snapshots
//! are published on a watch channel as immutable `Arc<Snapshot>` values, so
//! a reader can never observe a half-updated view, and the latest snapshot
//! stays available (flagged stale) across connectivity gaps.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use crate::catalog;
use crate::control::{self, ControlContext, ControlRequest};
use crate::error::{MonitorError, MonitorResult};
use crate::health::HealthMonitor;
use crate::models::{
    BatchReport, ControlAction, ControlTarget, Credentials, LogChunk, LogStream,
    PendingOperation, SessionState, Snapshot,
};
use crate::poll::{self, PollerContext, PollerHandle};
use crate::settings::MonitorSettings;
use crate::transport::{CommandOutput, Session, SshTransport, Transport};

/// Remote monitoring and control engine for one host
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct Monitor {
    session: Arc<Session>,
    health: Arc<HealthMonitor>,
    settings_tx: watch::Sender<MonitorSettings>,
    snapshot_rx: watch::Receiver<Arc<Snapshot>>,
    poll_trigger: mpsc::Sender<()>,
    poller: PollerHandle,
    queue_tx: mpsc::Sender<ControlRequest>,
    control_pending: Arc<AtomicUsize>,
    pending_ops: Arc<StdMutex<HashMap<Uuid, (PendingOperation, Arc<AtomicBool>)>>>,
}

impl Monitor {
    /// Creates an engine that connects over SSH with the given credentials
    #[must_use]
    pub fn new(credentials: Credentials, settings: MonitorSettings) -> Self {
        Self::with_transport(Box::new(SshTransport::new(credentials)), settings)
    }

    /// Creates an engine on an arbitrary transport
    ///
    /// This is the seam tests use to substitute a scripted transport; see
    /// [`crate::testing::MockTransport`].
    #[must_use]
    pub fn with_transport(transport: Box<dyn Transport>, settings: MonitorSettings) -> Self {
        let session = Arc::new(Session::new(transport));
        let (settings_tx, settings_rx) = watch::channel(settings);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(Snapshot::empty()));
        // Capacity 1: refresh requests coalesce instead of queueing
        let (poll_trigger, trigger_rx) = mpsc::channel::<()>(1);

        let health = HealthMonitor::new(
            Arc::clone(&session),
            settings_rx.clone(),
            poll_trigger.clone(),
        );
        let control_pending = Arc::new(AtomicUsize::new(0));

        let poller = poll::spawn(PollerContext {
            session: Arc::clone(&session),
            health: Arc::clone(&health),
            settings_rx: settings_rx.clone(),
            control_pending: Arc::clone(&control_pending),
            snapshot_tx,
            trigger_rx,
        });

        let queue_tx = control::spawn(ControlContext {
            session: Arc::clone(&session),
            health: Arc::clone(&health),
            settings_rx,
            snapshot_rx: snapshot_rx.clone(),
            control_pending: Arc::clone(&control_pending),
            poll_trigger: poll_trigger.clone(),
        });

        Self {
            session,
            health,
            settings_tx,
            snapshot_rx,
            poll_trigger,
            poller,
            queue_tx,
            control_pending,
            pending_ops: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// Establishes the session and schedules the first poll
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Auth`] or [`MonitorError::Network`]; the
    /// session is then `Failed` and a new `connect` (or
    /// [`Monitor::reconfigure`]) is required.
    pub async fn connect(&self) -> MonitorResult<SessionState> {
        let settings = self.settings_tx.borrow().clone();
        let state = self
            .session
            .connect(settings.connect_timeout(), settings.command_timeout())
            .await?;
        self.poll_now();
        Ok(state)
    }

    /// Returns a receiver of published snapshots
    ///
    /// The receiver always holds the latest snapshot; await `changed()` to
    /// observe new ones.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot_rx.clone()
    }

    /// Latest published snapshot
    #[must_use]
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Current session state
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Returns a receiver that observes session state transitions
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe_state()
    }

    /// Required remote commands the connect-time probe found missing
    #[must_use]
    pub fn missing_commands(&self) -> Vec<String> {
        self.session.missing_commands()
    }

    /// Number of consecutive failed transport calls
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.health.consecutive_failures()
    }

    /// Requests an out-of-cycle poll; coalesced with any pending request
    pub fn poll_now(&self) {
        let _ = self.poll_trigger.try_send(());
    }

    /// Replaces the engine settings; the poll timer picks the new interval
    /// up on its next tick without a restart
    pub fn update_settings(&self, settings: MonitorSettings) {
        self.settings_tx.send_replace(settings);
    }

    /// Current engine settings
    #[must_use]
    pub fn settings(&self) -> MonitorSettings {
        self.settings_tx.borrow().clone()
    }

    // -- control ------------------------------------------------------------

    /// Submits a control operation and waits for its report
    ///
    /// Operations execute in submission order, mutually exclusive with
    /// polling; a successful mutation is followed by an immediate poll.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::InvalidIdentifier`] before anything is
    /// queued when a name target fails validation, or
    /// [`MonitorError::NotConnected`] when the engine has shut down.
    pub async fn control(
        &self,
        action: ControlAction,
        target: ControlTarget,
    ) -> MonitorResult<BatchReport> {
        if let ControlTarget::Name(name) = &target {
            catalog::validate_identifier(name)?;
        }

        let op = PendingOperation {
            id: Uuid::new_v4(),
            target,
            action,
        };
        let cancelled = Arc::new(AtomicBool::new(false));
        self.pending_ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(op.id, (op.clone(), Arc::clone(&cancelled)));
        self.control_pending.fetch_add(1, Ordering::SeqCst);

        let (reply_tx, reply_rx) = oneshot::channel();
        let request = ControlRequest {
            op: op.clone(),
            cancelled,
            reply: reply_tx,
        };

        let result = if self.queue_tx.send(request).await.is_ok() {
            reply_rx.await.unwrap_or(Err(MonitorError::NotConnected))
        } else {
            self.control_pending.fetch_sub(1, Ordering::SeqCst);
            Err(MonitorError::NotConnected)
        };

        self.pending_ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&op.id);
        result
    }

    /// Starts one service by id
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Control`] with the remote stderr when the
    /// process manager reports a failure.
    pub async fn start_service(&self, id: i64) -> MonitorResult<()> {
        self.single(ControlAction::Start, ControlTarget::Id(id)).await
    }

    /// Stops one service by id; stopping an already-stopped service succeeds
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Control`] with the remote stderr when the
    /// process manager reports a failure.
    pub async fn stop_service(&self, id: i64) -> MonitorResult<()> {
        self.single(ControlAction::Stop, ControlTarget::Id(id)).await
    }

    /// Restarts one service by id
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Control`] with the remote stderr when the
    /// process manager reports a failure.
    pub async fn restart_service(&self, id: i64) -> MonitorResult<()> {
        self.single(ControlAction::Restart, ControlTarget::Id(id))
            .await
    }

    /// Starts every known service, reporting per-target outcomes
    ///
    /// # Errors
    ///
    /// Returns an error only when the operation could not run at all; a
    /// failing target is reported inside the [`BatchReport`] instead.
    pub async fn start_all(&self) -> MonitorResult<BatchReport> {
        self.control(ControlAction::Start, ControlTarget::All).await
    }

    /// Stops every known service, reporting per-target outcomes
    ///
    /// # Errors
    ///
    /// Returns an error only when the operation could not run at all.
    pub async fn stop_all(&self) -> MonitorResult<BatchReport> {
        self.control(ControlAction::Stop, ControlTarget::All).await
    }

    /// Restarts every known service, reporting per-target outcomes
    ///
    /// # Errors
    ///
    /// Returns an error only when the operation could not run at all.
    pub async fn restart_all(&self) -> MonitorResult<BatchReport> {
        self.control(ControlAction::Restart, ControlTarget::All)
            .await
    }

    async fn single(&self, action: ControlAction, target: ControlTarget) -> MonitorResult<()> {
        let report = self.control(action, target).await?;
        report
            .outcomes
            .into_iter()
            .next()
            .map_or(Ok(()), |outcome| outcome.result)
    }

    /// Control operations submitted but not yet completed
    #[must_use]
    pub fn pending_operations(&self) -> Vec<PendingOperation> {
        self.pending_ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|(op, _)| op.clone())
            .collect()
    }

    /// Cancels a queued operation that has not been dispatched yet
    ///
    /// Returns `true` when the operation was still pending. An operation
    /// already handed to the transport runs to completion regardless.
    pub fn cancel(&self, id: Uuid) -> bool {
        self.pending_ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(|(_, cancelled)| cancelled.store(true, Ordering::SeqCst))
            .is_some()
    }

    // -- logs and ad-hoc commands -------------------------------------------

    /// Fetches the tail of one service log, newest line last
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::NotFound`] when the service is not in the
    /// current snapshot, its log path is unknown, or the remote file is
    /// absent.
    pub async fn fetch_log_tail(
        &self,
        service_id: i64,
        stream: LogStream,
        lines: Option<u32>,
    ) -> MonitorResult<LogChunk> {
        let snapshot = self.current_snapshot();
        let record = snapshot
            .service(service_id)
            .ok_or_else(|| MonitorError::NotFound(format!("service {service_id}")))?;

        let path = match stream {
            LogStream::Stdout => &record.stdout_log_path,
            LogStream::Stderr => &record.stderr_log_path,
        };
        if path.is_empty() {
            return Err(MonitorError::NotFound(format!(
                "no {} log path for service {service_id}",
                match stream {
                    LogStream::Stdout => "stdout",
                    LogStream::Stderr => "stderr",
                }
            )));
        }

        let settings = self.settings_tx.borrow().clone();
        let line_count = lines.unwrap_or_else(|| settings.effective_log_tail_lines());
        let command = catalog::log_tail_command(path, line_count)?;

        match self.session.execute(&command, settings.command_timeout()).await {
            Ok(output) if output.success() => {
                self.health.record_success();
                Ok(LogChunk {
                    service_id,
                    stream,
                    lines: output.stdout.lines().map(ToString::to_string).collect(),
                })
            }
            Ok(output) => {
                let stderr = output.stderr.trim().to_string();
                if stderr.to_ascii_lowercase().contains("no such file") {
                    Err(MonitorError::NotFound(path.clone()))
                } else {
                    Err(MonitorError::Control {
                        exit_code: output.exit_code,
                        stderr,
                    })
                }
            }
            Err(err) => {
                HealthMonitor::observe(&self.health, &err);
                Err(err)
            }
        }
    }

    /// Runs an arbitrary command over the session (terminal pass-through)
    ///
    /// Shares the session's mutual exclusion with polling and control; the
    /// output is returned verbatim and never enters the structured model.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::NotConnected`] while the session is down, or
    /// the transport's execution error.
    pub async fn run_command(&self, command: &str) -> MonitorResult<CommandOutput> {
        let timeout = self.settings_tx.borrow().command_timeout();
        match self.session.execute(command, timeout).await {
            Ok(output) => {
                self.health.record_success();
                Ok(output)
            }
            Err(err) => {
                HealthMonitor::observe(&self.health, &err);
                Err(err)
            }
        }
    }

    // -- lifecycle ----------------------------------------------------------

    /// Tears the session down and reconnects with new credentials
    ///
    /// # Errors
    ///
    /// Returns the connect error of the new session.
    pub async fn reconfigure(&self, credentials: Credentials) -> MonitorResult<SessionState> {
        self.session
            .replace_transport(Box::new(SshTransport::new(credentials)))
            .await;
        self.connect().await
    }

    /// Stops the poll timer and closes the session
    pub async fn close(&self) {
        self.poller.stop().await;
        self.session.close().await;
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("state", &self.session_state())
            .field("pending", &self.control_pending.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
