//! Test support: a scripted transport for exercising the engine
//!
//! [`MockTransport`] answers commands from substring-matched rules, records
//! every call, and tracks how many executions were ever in flight at once —
//! the engine's single-command-in-flight guarantee is asserted by checking
//! that high-water mark. Cloning the transport shares its state, so a test
//! can hand one clone to the engine and keep another for scripting and
//! inspection.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::MonitorResult;
use crate::transport::{CommandOutput, Transport};

struct Rule {
    needle: String,
    responses: VecDeque<MonitorResult<CommandOutput>>,
}

#[derive(Default)]
struct MockState {
    rules: Mutex<Vec<Rule>>,
    connect_results: Mutex<VecDeque<MonitorResult<()>>>,
    calls: Mutex<Vec<String>>,
    exec_delay: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    connect_count: AtomicUsize,
    close_count: AtomicUsize,
}

/// Scripted in-memory transport
///
/// Commands are matched against rules in registration order by substring;
/// the first match wins. A rule with several responses yields them in order
/// and then repeats the last one. Unmatched commands succeed with empty
/// output, which conveniently makes the required-command probe report
/// nothing missing.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<MockState>,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Creates a transport with no rules
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a successful output with the given stdout
    #[must_use]
    pub fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    /// Shorthand for a failed output with the given exit code and stderr
    #[must_use]
    pub fn fail(exit_code: i32, stderr: &str) -> CommandOutput {
        CommandOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code,
        }
    }

    /// Registers (or extends) a rule answering commands containing `needle`
    pub fn respond(&self, needle: &str, output: CommandOutput) {
        self.respond_with(needle, Ok(output));
    }

    /// Registers (or extends) a rule with a full result, including errors
    pub fn respond_with(&self, needle: &str, result: MonitorResult<CommandOutput>) {
        let mut rules = lock(&self.inner.rules);
        if let Some(rule) = rules.iter_mut().find(|r| r.needle == needle) {
            rule.responses.push_back(result);
        } else {
            rules.push(Rule {
                needle: needle.to_string(),
                responses: VecDeque::from([result]),
            });
        }
    }

    /// Replaces a rule's response queue wholesale
    ///
    /// Unlike [`MockTransport::respond_with`], which appends to a sequence,
    /// this discards whatever the rule held before — the way to change a
    /// command's behavior mid-test.
    pub fn set_response(&self, needle: &str, result: MonitorResult<CommandOutput>) {
        let mut rules = lock(&self.inner.rules);
        if let Some(rule) = rules.iter_mut().find(|r| r.needle == needle) {
            rule.responses = VecDeque::from([result]);
        } else {
            rules.push(Rule {
                needle: needle.to_string(),
                responses: VecDeque::from([result]),
            });
        }
    }

    /// Queues a result for the next `connect` call (defaults to success)
    pub fn push_connect_result(&self, result: MonitorResult<()>) {
        lock(&self.inner.connect_results).push_back(result);
    }

    /// Adds artificial latency to every execution, widening the window in
    /// which an overlapping call could be observed
    pub fn set_exec_delay(&self, delay: Duration) {
        *lock(&self.inner.exec_delay) = delay;
    }

    /// Every command string executed, in order
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.inner.calls).clone()
    }

    /// Number of executed commands containing `needle`
    #[must_use]
    pub fn call_count(&self, needle: &str) -> usize {
        lock(&self.inner.calls)
            .iter()
            .filter(|c| c.contains(needle))
            .count()
    }

    /// Highest number of concurrently in-flight executions observed
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    /// Number of `connect` calls made
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.inner.connect_count.load(Ordering::SeqCst)
    }

    /// Number of `close` calls made
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.inner.close_count.load(Ordering::SeqCst)
    }

    fn response_for(&self, command: &str) -> MonitorResult<CommandOutput> {
        let mut rules = lock(&self.inner.rules);
        for rule in rules.iter_mut() {
            if command.contains(rule.needle.as_str()) {
                return if rule.responses.len() > 1 {
                    rule.responses.pop_front().unwrap_or(Ok(CommandOutput::default()))
                } else {
                    rule.responses
                        .front()
                        .cloned()
                        .unwrap_or(Ok(CommandOutput::default()))
                };
            }
        }
        Ok(CommandOutput::default())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, _timeout: Duration) -> MonitorResult<()> {
        self.inner.connect_count.fetch_add(1, Ordering::SeqCst);
        let mut results = lock(&self.inner.connect_results);
        match results.pop_front() {
            Some(result) => result,
            None => Ok(()),
        }
    }

    async fn execute(&self, command: &str, _timeout: Duration) -> MonitorResult<CommandOutput> {
        lock(&self.inner.calls).push(command.to_string());

        let current = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner
            .max_in_flight
            .fetch_max(current, Ordering::SeqCst);

        let delay = *lock(&self.inner.exec_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = self.response_for(command);
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn close(&self) {
        self.inner.close_count.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rules_match_by_substring_in_order() {
        let mock = MockTransport::new();
        mock.respond("pm2 jlist", MockTransport::ok("[]"));
        mock.respond("pm2", MockTransport::fail(1, "catch-all"));

        let out = mock.execute("pm2 jlist", Duration::from_secs(1)).await.unwrap();
        assert_eq!(out.stdout, "[]");

        let out = mock.execute("pm2 stop 1", Duration::from_secs(1)).await.unwrap();
        assert_eq!(out.exit_code, 1);
    }

    #[tokio::test]
    async fn test_sequenced_responses_repeat_last() {
        let mock = MockTransport::new();
        mock.respond("free", MockTransport::ok("first"));
        mock.respond("free", MockTransport::ok("second"));

        let a = mock.execute("free -m", Duration::from_secs(1)).await.unwrap();
        let b = mock.execute("free -m", Duration::from_secs(1)).await.unwrap();
        let c = mock.execute("free -m", Duration::from_secs(1)).await.unwrap();
        assert_eq!(a.stdout, "first");
        assert_eq!(b.stdout, "second");
        assert_eq!(c.stdout, "second");
    }

    #[tokio::test]
    async fn test_unmatched_commands_succeed_empty() {
        let mock = MockTransport::new();
        let out = mock.execute("uptime", Duration::from_secs(1)).await.unwrap();
        assert!(out.success());
        assert!(out.stdout.is_empty());
        assert_eq!(mock.calls(), vec!["uptime".to_string()]);
    }
}
