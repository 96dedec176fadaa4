//! Connection manager: drives one realtime session through the reconnect policy.

use tokio::sync::{mpsc, watch};

use crate::reconnect::{
    classify_close_code, JitterSource, ReconnectPolicy, RetryDecision, ThreadJitter,
};

use super::connector::Connector;
use super::control::{aborted, AbortHandle};
use super::error::SessionError;
use super::state::{ConnectionState, Disconnect, StateChange};

/// Owns one logical realtime connection.
///
/// `run` takes `&mut self`, so a manager never has two connects or retry waits
/// in flight at once. Successful connection resets the attempt counter.
pub struct ConnectionManager<C: Connector> {
    url: String,
    policy: ReconnectPolicy,
    connector: C,
    jitter: Box<dyn JitterSource + Send>,
    state: ConnectionState,
    events: Option<mpsc::Sender<StateChange>>,
    abort: AbortHandle,
    abort_rx: watch::Receiver<bool>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(url: impl Into<String>, policy: ReconnectPolicy, connector: C) -> Self {
        let (abort, abort_rx) = AbortHandle::new();
        Self {
            url: url.into(),
            policy,
            connector,
            jitter: Box::new(ThreadJitter),
            state: ConnectionState::Idle,
            events: None,
            abort,
            abort_rx,
        }
    }

    /// Replace the jitter source (e.g. a seeded RNG for reproducible schedules).
    pub fn with_jitter(mut self, jitter: impl JitterSource + Send + 'static) -> Self {
        self.jitter = Box::new(jitter);
        self
    }

    /// Send every state transition to `tx`. Events are never waited on: when
    /// the channel is full or the receiver is gone, the event is dropped.
    pub fn with_events(mut self, tx: mpsc::Sender<StateChange>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Connect and keep the session alive until it closes cleanly, the abort
    /// handle fires, or the policy gives up.
    ///
    /// Abort is permanent: once the handle has fired, this and every later
    /// call return [`Disconnect::Aborted`] without connecting.
    pub async fn run(&mut self) -> Result<Disconnect, SessionError> {
        let mut abort_rx = self.abort_rx.clone();
        let mut attempt = 1u32;

        loop {
            if self.abort.is_aborted() {
                return Ok(self.finish_aborted());
            }
            self.transition(ConnectionState::Connecting { attempt });
            tracing::debug!(attempt, url = %self.url, "connecting realtime session");

            let outcome = tokio::select! {
                res = self.connector.connect(&self.url) => Some(res),
                _ = aborted(&mut abort_rx) => None,
            };
            let Some(outcome) = outcome else {
                return Ok(self.finish_aborted());
            };

            let signal = match outcome {
                Ok(mut session) => {
                    attempt = 1;
                    self.transition(ConnectionState::Connected);
                    tracing::info!(url = %self.url, "realtime session connected");

                    let closed = tokio::select! {
                        signal = self.connector.wait_closed(&mut session) => Some(signal),
                        _ = aborted(&mut abort_rx) => None,
                    };
                    drop(session);
                    let Some(signal) = closed else {
                        return Ok(self.finish_aborted());
                    };
                    if let Some(code) = signal.close_code() {
                        if classify_close_code(code).is_clean() {
                            tracing::info!(code, "realtime session closed cleanly");
                            self.transition(ConnectionState::Idle);
                            return Ok(Disconnect::Clean { code });
                        }
                    }
                    signal
                }
                Err(signal) => signal,
            };

            match self.policy.decide(&signal, attempt, self.jitter.as_mut()) {
                RetryDecision::RetryAfter(delay) => {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        failure = %signal,
                        "realtime connection failed; retrying"
                    );
                    self.transition(ConnectionState::RetryWait { attempt, delay });
                    let woke_by_abort = tokio::select! {
                        _ = tokio::time::sleep(delay) => false,
                        _ = aborted(&mut abort_rx) => true,
                    };
                    if woke_by_abort {
                        return Ok(self.finish_aborted());
                    }
                    attempt += 1;
                }
                RetryDecision::NoRetry(reason) => {
                    tracing::error!(
                        attempts = attempt,
                        reason = reason.as_label(),
                        failure = %signal,
                        "realtime connection failed; giving up"
                    );
                    self.transition(ConnectionState::Failed {
                        attempts: attempt,
                        reason,
                    });
                    return Err(SessionError::Failed {
                        attempts: attempt,
                        reason,
                        last: signal,
                    });
                }
            }
        }
    }

    fn finish_aborted(&mut self) -> Disconnect {
        tracing::info!(url = %self.url, "realtime session aborted");
        self.transition(ConnectionState::Idle);
        Disconnect::Aborted
    }

    fn transition(&mut self, next: ConnectionState) {
        let previous = std::mem::replace(&mut self.state, next.clone());
        if let Some(tx) = &self.events {
            let change = StateChange {
                previous,
                current: next,
            };
            if let Err(e) = tx.try_send(change) {
                let why = match e {
                    mpsc::error::TrySendError::Full(_) => "full",
                    mpsc::error::TrySendError::Closed(_) => "closed",
                };
                tracing::debug!(channel = why, "state change event dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconnect::{BackoffConfig, FailureSignal, FixedJitter, StopReason};
    use crate::session::connector::{ScriptStep, ScriptedConnector};
    use std::time::Duration;

    fn fail(code: u16) -> ScriptStep {
        ScriptStep::Fail(FailureSignal::close(code))
    }

    fn manager(steps: Vec<ScriptStep>) -> ConnectionManager<ScriptedConnector> {
        ConnectionManager::new(
            "ws://localhost:3001/realtime",
            ReconnectPolicy::default(),
            ScriptedConnector::new(steps),
        )
        .with_jitter(FixedJitter(0.0))
    }

    fn drain(rx: &mut mpsc::Receiver<StateChange>) -> Vec<ConnectionState> {
        let mut states = Vec::new();
        while let Ok(change) = rx.try_recv() {
            states.push(change.current);
        }
        states
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_fails_without_retry() {
        let mut m = manager(vec![ScriptStep::Fail(FailureSignal::error("Authentication failed"))]);
        let err = m.run().await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Failed {
                attempts: 1,
                reason: StopReason::Fatal,
                last: FailureSignal::error("Authentication failed"),
            }
        );
        assert_eq!(m.connector().connects(), 1);
        assert!(m.state().is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_then_connects_and_closes_cleanly() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut m = manager(vec![
            fail(1006),
            ScriptStep::Fail(FailureSignal::error("ECONNREFUSED")),
            ScriptStep::Open {
                close: Some(FailureSignal::close(1000)),
            },
        ])
        .with_events(tx);

        assert_eq!(m.run().await, Ok(Disconnect::Clean { code: 1000 }));
        assert_eq!(
            drain(&mut rx),
            vec![
                ConnectionState::Connecting { attempt: 1 },
                ConnectionState::RetryWait {
                    attempt: 1,
                    delay: Duration::from_millis(500)
                },
                ConnectionState::Connecting { attempt: 2 },
                ConnectionState::RetryWait {
                    attempt: 2,
                    delay: Duration::from_millis(1000)
                },
                ConnectionState::Connecting { attempt: 3 },
                ConnectionState::Connected,
                ConnectionState::Idle,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn drop_after_connect_starts_a_fresh_cycle() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut m = manager(vec![
            fail(1006),
            fail(1006),
            ScriptStep::Open {
                close: Some(FailureSignal::close(1006)),
            },
            fail(1006),
            ScriptStep::Open {
                close: Some(FailureSignal::close(1001)),
            },
        ])
        .with_events(tx);

        assert_eq!(m.run().await, Ok(Disconnect::Clean { code: 1001 }));
        let waits: Vec<(u32, Duration)> = drain(&mut rx)
            .into_iter()
            .filter_map(|s| match s {
                ConnectionState::RetryWait { attempt, delay } => Some((attempt, delay)),
                _ => None,
            })
            .collect();
        // The drop after connecting counts as attempt 1 again: base delay.
        assert_eq!(
            waits,
            vec![
                (1, Duration::from_millis(500)),
                (2, Duration::from_millis(1000)),
                (1, Duration::from_millis(500)),
                (2, Duration::from_millis(1000)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn abort_cancels_pending_retry_wait() {
        let policy = ReconnectPolicy::new(BackoffConfig::from_millis(60_000, 60_000, 0).unwrap(), 5)
            .unwrap();
        let mut m = ConnectionManager::new("ws://x", policy, ScriptedConnector::new(vec![fail(1006)]));
        let handle = m.abort_handle();
        let task = tokio::spawn(async move {
            let result = m.run().await;
            (result, m.connector().connects(), m.state().clone())
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.abort();
        let (result, connects, state) = task.await.unwrap();
        assert_eq!(result, Ok(Disconnect::Aborted));
        assert_eq!(connects, 1);
        assert_eq!(state, ConnectionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_while_connected() {
        let mut m = manager(vec![ScriptStep::Open { close: None }]);
        let handle = m.abort_handle();
        let task = tokio::spawn(async move { m.run().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.abort();
        assert_eq!(task.await.unwrap(), Ok(Disconnect::Aborted));
    }

    #[tokio::test]
    async fn aborted_before_run_never_connects() {
        let mut m = manager(vec![fail(1006)]);
        m.abort_handle().abort();
        assert_eq!(m.run().await, Ok(Disconnect::Aborted));
        assert_eq!(m.connector().connects(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_with_undrained_event_channel() {
        let (tx, _rx) = mpsc::channel(1);
        let mut m = manager((0..5).map(|_| fail(1006)).collect()).with_events(tx);
        let handle = m.abort_handle();
        let task = tokio::spawn(async move { m.run().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();
        let result = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("run must end after abort even if nobody reads events")
            .unwrap();
        assert_eq!(result, Ok(Disconnect::Aborted));
    }

    #[tokio::test(start_paused = true)]
    async fn full_event_channel_does_not_stall_retries() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut m = manager(vec![
            fail(1006),
            fail(1006),
            ScriptStep::Open {
                close: Some(FailureSignal::close(1000)),
            },
        ])
        .with_events(tx);
        assert_eq!(m.run().await, Ok(Disconnect::Clean { code: 1000 }));
        assert_eq!(m.connector().connects(), 3);
        // Only the first transition fit; the rest were dropped.
        assert_eq!(drain(&mut rx), vec![ConnectionState::Connecting { attempt: 1 }]);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_is_permanent_across_runs() {
        let mut m = manager(vec![ScriptStep::Open { close: None }, fail(1006)]);
        let handle = m.abort_handle();
        handle.abort();
        assert_eq!(m.run().await, Ok(Disconnect::Aborted));
        assert_eq!(m.run().await, Ok(Disconnect::Aborted));
        assert_eq!(m.connector().connects(), 0);
        assert!(handle.is_aborted());
    }

    #[tokio::test(start_paused = true)]
    async fn auth_close_code_is_terminal() {
        let mut m = manager(vec![fail(4001)]);
        match m.run().await {
            Err(SessionError::Failed { reason, .. }) => {
                assert_eq!(reason, StopReason::FatalClose(4001))
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
