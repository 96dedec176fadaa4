use std::fmt;
use std::time::Duration;

use super::backoff::BackoffConfig;
use super::classify::{classify_close_code, is_retriable_error};
use super::error::ConfigError;
use super::jitter::JitterSource;
use super::signal::FailureSignal;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Why no further attempt will be made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The attempt that just failed was the last one in the budget.
    AttemptsExhausted,
    /// Peer closed on purpose (1000 / 1001).
    CleanClose(u16),
    /// Close code that retrying cannot fix.
    FatalClose(u16),
    /// Error that is not a recognised transient condition.
    Fatal,
}

impl StopReason {
    pub fn as_label(&self) -> &'static str {
        match self {
            StopReason::AttemptsExhausted => "attempts_exhausted",
            StopReason::CleanClose(_) => "clean_close",
            StopReason::FatalClose(_) => "fatal_close",
            StopReason::Fatal => "fatal_error",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::AttemptsExhausted => write!(f, "attempt budget exhausted"),
            StopReason::CleanClose(code) => write!(f, "closed cleanly ({})", code),
            StopReason::FatalClose(code) => write!(f, "non-retriable close code {}", code),
            StopReason::Fatal => write!(f, "non-retriable error"),
        }
    }
}

/// Decision returned by the reconnect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not reconnect.
    NoRetry(StopReason),
    /// Reconnect after the given delay.
    RetryAfter(Duration),
}

/// Whether to schedule another attempt after `attempt_count` (1-based, the
/// attempt that just failed) failed with `signal`.
///
/// Reaching `max_attempts` stops; it does not permit one more. Deterministic:
/// no randomness or hidden state is involved.
pub fn should_retry(signal: &FailureSignal, attempt_count: u32, max_attempts: u32) -> bool {
    stop_reason(signal, attempt_count, max_attempts).is_none()
}

fn stop_reason(signal: &FailureSignal, attempt_count: u32, max_attempts: u32) -> Option<StopReason> {
    if attempt_count >= max_attempts {
        return Some(StopReason::AttemptsExhausted);
    }
    if let Some(code) = signal.close_code() {
        let class = classify_close_code(code);
        return if class.is_retriable() {
            None
        } else if class.is_clean() {
            Some(StopReason::CleanClose(code))
        } else {
            Some(StopReason::FatalClose(code))
        };
    }
    if is_retriable_error(signal) {
        None
    } else {
        Some(StopReason::Fatal)
    }
}

/// Backoff constants plus the attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub backoff: BackoffConfig,
    /// Maximum number of attempts per failure cycle (including the first).
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            backoff: BackoffConfig::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    pub fn new(backoff: BackoffConfig, max_attempts: u32) -> Result<Self, ConfigError> {
        backoff.validate()?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(max_attempts));
        }
        Ok(Self {
            backoff,
            max_attempts,
        })
    }

    pub fn should_retry(&self, signal: &FailureSignal, attempt: u32) -> bool {
        should_retry(signal, attempt, self.max_attempts)
    }

    /// Decide what to do after `attempt` (1-based) failed with `signal`.
    ///
    /// The retry gate is evaluated first; `rng` is consulted only when a delay
    /// is actually needed.
    pub fn decide<J: JitterSource + ?Sized>(
        &self,
        signal: &FailureSignal,
        attempt: u32,
        rng: &mut J,
    ) -> RetryDecision {
        match stop_reason(signal, attempt, self.max_attempts) {
            Some(reason) => RetryDecision::NoRetry(reason),
            None => RetryDecision::RetryAfter(self.backoff.next_delay(attempt, rng)),
        }
    }
}
