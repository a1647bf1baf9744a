//! Connection health tracking and reconnection with exponential backoff
//!
//! The health monitor classifies failures reported by the poll and control
//! engines, drives the session state machine, and runs the bounded
//! reconnection loop. Reconnection delays follow
//! `min(initial_delay * multiplier^attempt, max_delay)` for a bounded number
//! of attempts, after which the session is marked failed and requires an
//! explicit reconfiguration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::error::MonitorError;
use crate::models::SessionState;
use crate::settings::MonitorSettings;
use crate::transport::session::Session;

/// Default maximum number of reconnection attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default initial delay between reconnection attempts in milliseconds
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 2000;

/// Default maximum delay between reconnection attempts in milliseconds
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Default backoff multiplier (delay doubles each attempt)
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Configuration for reconnection behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of reconnection attempts (0 = never reconnect)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Initial delay before the first attempt in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound on the delay between attempts in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_initial_delay_ms() -> u64 {
    DEFAULT_INITIAL_DELAY_MS
}

const fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}

const fn default_backoff_multiplier() -> f64 {
    DEFAULT_BACKOFF_MULTIPLIER
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryConfig {
    /// Creates a retry configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of reconnection attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the initial delay before the first attempt
    #[must_use]
    pub const fn with_initial_delay_ms(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    /// Sets the upper bound on the delay between attempts
    #[must_use]
    pub const fn with_max_delay_ms(mut self, delay_ms: u64) -> Self {
        self.max_delay_ms = delay_ms;
        self
    }

    /// Sets the backoff multiplier
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the delay for a given attempt number (0-indexed)
    ///
    /// Returns `None` once `attempt` reaches `max_attempts`, signalling that
    /// the session should transition to failed instead of retrying again.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }

        let delay_ms = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped_delay_ms = (delay_ms as u64).min(self.max_delay_ms);

        Some(Duration::from_millis(capped_delay_ms))
    }
}

/// Tracks transport failures and drives bounded reconnection
///
/// One instance per [`Session`]. The poll and control engines report every
/// command outcome here; connectivity errors flip the session to
/// `Disconnected` and start (at most one) reconnection loop.
pub struct HealthMonitor {
    session: Arc<Session>,
    settings_rx: watch::Receiver<MonitorSettings>,
    poll_trigger: mpsc::Sender<()>,
    consecutive_failures: AtomicU32,
    reconnecting: AtomicBool,
}

impl HealthMonitor {
    /// Creates a health monitor for the given session
    #[must_use]
    pub fn new(
        session: Arc<Session>,
        settings_rx: watch::Receiver<MonitorSettings>,
        poll_trigger: mpsc::Sender<()>,
    ) -> Arc<Self> {
        Arc::new(Self {
            session,
            settings_rx,
            poll_trigger,
            consecutive_failures: AtomicU32::new(0),
            reconnecting: AtomicBool::new(false),
        })
    }

    /// Number of consecutive failed transport calls
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Records a successful transport call
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    /// Classifies a failed engine operation and reacts to it
    ///
    /// Connectivity errors mark the session disconnected and start the
    /// reconnection loop. Parse errors are counted but never affect the
    /// connection state. `NotConnected` is expected while a reconnect is
    /// already in flight and is ignored.
    pub fn observe(this: &Arc<Self>, err: &MonitorError) {
        if err.is_connectivity() {
            let failures = this.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::warn!(error = %err, failures, "transport call failed");
            this.session.set_state(SessionState::Disconnected);
            if this
                .reconnecting
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                tokio::spawn(Self::reconnect_loop(Arc::clone(this)));
            }
        } else if let MonitorError::Parse(msg) = err {
            tracing::debug!(error = %msg, "remote output could not be parsed");
        }
    }

    /// Whether a reconnection loop is currently running
    #[must_use]
    pub fn is_reconnecting(&self) -> bool {
        self.reconnecting.load(Ordering::Relaxed)
    }

    async fn reconnect_loop(this: Arc<Self>) {
        let settings = this.settings_rx.borrow().clone();
        let retry = settings.retry.clone();

        let mut attempt: u32 = 0;
        loop {
            let Some(delay) = retry.delay_for_attempt(attempt) else {
                tracing::warn!(
                    attempts = attempt,
                    "reconnection attempts exhausted, session failed"
                );
                this.session.set_state(SessionState::Failed);
                break;
            };

            tracing::info!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "reconnecting");
            tokio::time::sleep(delay).await;

            match this
                .session
                .reconnect(settings.connect_timeout(), settings.command_timeout())
                .await
            {
                Ok(state) => {
                    tracing::info!(%state, "reconnected");
                    this.record_success();
                    // Refresh the stale snapshot as soon as the link is back
                    let _ = this.poll_trigger.try_send(());
                    break;
                }
                Err(MonitorError::Auth(msg)) => {
                    // Credentials will not fix themselves; stop retrying
                    tracing::warn!(error = %msg, "authentication failed during reconnect");
                    this.session.set_state(SessionState::Failed);
                    break;
                }
                Err(err) => {
                    tracing::debug!(error = %err, attempt = attempt + 1, "reconnect attempt failed");
                    this.session.set_state(SessionState::Disconnected);
                }
            }

            attempt += 1;
        }

        this.reconnecting.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.initial_delay_ms, DEFAULT_INITIAL_DELAY_MS);
        assert_eq!(config.max_delay_ms, DEFAULT_MAX_DELAY_MS);
    }

    #[test]
    fn test_delay_doubles_then_caps() {
        let config = RetryConfig::new()
            .with_max_attempts(6)
            .with_initial_delay_ms(2000)
            .with_max_delay_ms(8000)
            .with_backoff_multiplier(2.0);

        assert_eq!(
            config.delay_for_attempt(0),
            Some(Duration::from_millis(2000))
        );
        assert_eq!(
            config.delay_for_attempt(1),
            Some(Duration::from_millis(4000))
        );
        assert_eq!(
            config.delay_for_attempt(2),
            Some(Duration::from_millis(8000))
        );
        // 16000 would exceed the cap
        assert_eq!(
            config.delay_for_attempt(3),
            Some(Duration::from_millis(8000))
        );
    }

    #[test]
    fn test_delays_non_decreasing() {
        let config = RetryConfig::default();
        let mut prev = Duration::ZERO;
        for attempt in 0..config.max_attempts {
            let delay = config.delay_for_attempt(attempt).unwrap();
            assert!(delay >= prev);
            prev = delay;
        }
    }

    #[test]
    fn test_attempts_bounded() {
        let config = RetryConfig::new().with_max_attempts(3);
        assert!(config.delay_for_attempt(2).is_some());
        assert!(config.delay_for_attempt(3).is_none());

        let never = RetryConfig::new().with_max_attempts(0);
        assert!(never.delay_for_attempt(0).is_none());
    }
}
