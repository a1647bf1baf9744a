//! Session wrapper: state tracking and command serialization
//!
//! The session owns the transport and is the single mutual-exclusion point
//! of the engine: at most one remote command is in flight at any instant.
//! The process manager's CLI is not guaranteed to tolerate concurrent
//! invocations on every target environment, so the lock is held across the
//! whole dispatch, and both the poll and control engines go through here.

use std::sync::Mutex as StdMutex;
use std::sync::PoisonError;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, watch};

use super::{CommandOutput, Transport};
use crate::catalog;
use crate::error::{MonitorError, MonitorResult};
use crate::models::SessionState;

/// The engine's single authenticated remote session
pub struct Session {
    transport: RwLock<Box<dyn Transport>>,
    cmd_lock: Mutex<()>,
    state_tx: watch::Sender<SessionState>,
    missing_commands: StdMutex<Vec<String>>,
}

impl Session {
    /// Wraps a transport in a disconnected session
    #[must_use]
    pub fn new(transport: Box<dyn Transport>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Disconnected);
        Self {
            transport: RwLock::new(transport),
            cmd_lock: Mutex::new(()),
            state_tx,
            missing_commands: StdMutex::new(Vec::new()),
        }
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Returns a receiver that observes every state transition
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        self.state_tx.send_replace(state);
    }

    /// Required remote commands found missing by the connect-time probe
    #[must_use]
    pub fn missing_commands(&self) -> Vec<String> {
        self.missing_commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records a required command discovered missing after connect
    ///
    /// Flips a ready session to degraded; already-degraded and disconnected
    /// sessions keep their state.
    pub(crate) fn note_missing_command(&self, name: &str) {
        let mut missing = self
            .missing_commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
            tracing::warn!(command = name, "required remote command is missing");
        }
        drop(missing);
        if self.state() == SessionState::Ready {
            self.set_state(SessionState::Degraded);
        }
    }

    /// Establishes the session for the first time
    ///
    /// # Errors
    ///
    /// Returns the transport's connect error; the session is left in the
    /// `Failed` state and is not retried automatically.
    pub async fn connect(
        &self,
        connect_timeout: Duration,
        command_timeout: Duration,
    ) -> MonitorResult<SessionState> {
        match self.establish(connect_timeout, command_timeout).await {
            Ok(state) => Ok(state),
            Err(err) => {
                self.set_state(SessionState::Failed);
                Err(err)
            }
        }
    }

    /// Re-establishes the session after a connectivity failure
    ///
    /// Unlike [`Session::connect`], a failed attempt leaves the session
    /// `Disconnected` so the caller's backoff loop can try again.
    ///
    /// # Errors
    ///
    /// Returns the transport's connect error.
    pub async fn reconnect(
        &self,
        connect_timeout: Duration,
        command_timeout: Duration,
    ) -> MonitorResult<SessionState> {
        match self.establish(connect_timeout, command_timeout).await {
            Ok(state) => Ok(state),
            Err(err) => {
                self.set_state(SessionState::Disconnected);
                Err(err)
            }
        }
    }

    async fn establish(
        &self,
        connect_timeout: Duration,
        command_timeout: Duration,
    ) -> MonitorResult<SessionState> {
        self.set_state(SessionState::Connecting);

        // Hold the command lock so no poll or control dispatch interleaves
        // with the handshake and probe.
        let _guard = self.cmd_lock.lock().await;
        let transport = self.transport.read().await;

        transport.connect(connect_timeout).await?;

        let probe = transport
            .execute(&catalog::probe_required_commands(), command_timeout)
            .await?;
        let missing = catalog::parse_probe_output(&probe.stdout);

        let state = if missing.is_empty() {
            SessionState::Ready
        } else {
            tracing::warn!(missing = ?missing, "remote host lacks required commands");
            SessionState::Degraded
        };

        *self
            .missing_commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = missing;
        self.set_state(state);
        Ok(state)
    }

    /// Executes one remote command under the session lock
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::NotConnected`] immediately (without touching
    /// the transport) while the session is down, otherwise whatever the
    /// transport reports.
    pub async fn execute(
        &self,
        command: &str,
        timeout: Duration,
    ) -> MonitorResult<CommandOutput> {
        if !self.state().is_connected() {
            return Err(MonitorError::NotConnected);
        }

        let _guard = self.cmd_lock.lock().await;
        // The state may have flipped while waiting for the lock
        if !self.state().is_connected() {
            return Err(MonitorError::NotConnected);
        }

        let transport = self.transport.read().await;
        transport.execute(command, timeout).await
    }

    /// Closes the transport and marks the session disconnected; idempotent
    pub async fn close(&self) {
        let _guard = self.cmd_lock.lock().await;
        self.transport.read().await.close().await;
        self.set_state(SessionState::Disconnected);
    }

    /// Swaps in a transport built from new credentials
    ///
    /// The old session is closed first; the new one starts disconnected and
    /// must be connected explicitly.
    pub async fn replace_transport(&self, transport: Box<dyn Transport>) {
        let _guard = self.cmd_lock.lock().await;
        self.transport.read().await.close().await;
        *self.transport.write().await = transport;
        self.missing_commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.set_state(SessionState::Disconnected);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
