//! Validation errors for reconnect parameters.

use std::time::Duration;
use thiserror::Error;

/// Returned when backoff or attempt-budget parameters are out of range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Base delay was zero, or the cap was below the base.
    #[error("invalid backoff: base delay {base:?} must be > 0 and <= cap {cap:?}")]
    InvalidBackoff { base: Duration, cap: Duration },
    /// The attempt budget must allow at least one attempt.
    #[error("invalid max_attempts {0}: must be at least 1")]
    InvalidMaxAttempts(u32),
}
