//! Capped exponential backoff with additive jitter.
//!
//! The delay for attempt `n` (1-based) is `min(cap, base × 2^(n-1))` plus a
//! jitter offset in `[0, jitter)`. Jitter only ever adds to the floor.

use std::time::Duration;

use super::error::ConfigError;
use super::jitter::{JitterSource, ThreadJitter};

const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_CAP_DELAY: Duration = Duration::from_millis(5000);
const DEFAULT_JITTER: Duration = Duration::from_millis(250);

/// Backoff constants for one connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Upper bound on the exponential term (jitter may add on top).
    pub cap_delay: Duration,
    /// Width of the additive jitter window.
    pub jitter: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            cap_delay: DEFAULT_CAP_DELAY,
            jitter: DEFAULT_JITTER,
        }
    }
}

impl BackoffConfig {
    /// Build a validated config: `base > 0` and `cap >= base`.
    pub fn new(base_delay: Duration, cap_delay: Duration, jitter: Duration) -> Result<Self, ConfigError> {
        let cfg = Self {
            base_delay,
            cap_delay,
            jitter,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_millis(base_ms: u64, cap_ms: u64, jitter_ms: u64) -> Result<Self, ConfigError> {
        Self::new(
            Duration::from_millis(base_ms),
            Duration::from_millis(cap_ms),
            Duration::from_millis(jitter_ms),
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_delay.is_zero() || self.cap_delay < self.base_delay {
            return Err(ConfigError::InvalidBackoff {
                base: self.base_delay,
                cap: self.cap_delay,
            });
        }
        Ok(())
    }

    /// Jitter-free part of the delay for `attempt`.
    pub fn delay_floor(&self, attempt: u32) -> Duration {
        exponential_term(attempt, self.base_delay, self.cap_delay)
    }

    /// Full delay for `attempt`, drawing jitter from `rng`.
    pub fn next_delay<J: JitterSource + ?Sized>(&self, attempt: u32, rng: &mut J) -> Duration {
        compute_next_delay(attempt, self.base_delay, self.cap_delay, self.jitter, rng)
    }
}

/// Wait time before reconnection attempt `attempt` (1-based; 0 is read as 1).
///
/// Returns a value in `[floor, floor + jitter)` where
/// `floor = min(cap, base × 2^(attempt-1))`. Safe for every `u32`: the term is
/// computed in u128 nanoseconds and shifts that would overflow return `cap`.
pub fn compute_next_delay<J: JitterSource + ?Sized>(
    attempt: u32,
    base: Duration,
    cap: Duration,
    jitter: Duration,
    rng: &mut J,
) -> Duration {
    let floor = exponential_term(attempt, base, cap);
    floor.saturating_add(jitter_offset(jitter, rng))
}

/// Delay for `attempt` with the default constants (500ms base, 5s cap, 250ms
/// jitter) and thread-local randomness.
pub fn get_retry_delay(attempt: u32) -> Duration {
    BackoffConfig::default().next_delay(attempt, &mut ThreadJitter)
}

fn exponential_term(attempt: u32, base: Duration, cap: Duration) -> Duration {
    if base.is_zero() || base >= cap {
        return base.min(cap);
    }
    let exponent = attempt.max(1) - 1;
    let base_ns = base.as_nanos();
    let cap_ns = cap.as_nanos();
    // Shifting by leading_zeros or more reaches 2^127, far beyond any cap.
    if exponent >= base_ns.leading_zeros() {
        return cap;
    }
    duration_from_nanos((base_ns << exponent).min(cap_ns)).unwrap_or(cap)
}

fn duration_from_nanos(nanos: u128) -> Option<Duration> {
    let secs = u64::try_from(nanos / 1_000_000_000).ok()?;
    Some(Duration::new(secs, (nanos % 1_000_000_000) as u32))
}

fn jitter_offset<J: JitterSource + ?Sized>(jitter: Duration, rng: &mut J) -> Duration {
    let window_ns = u64::try_from(jitter.as_nanos()).unwrap_or(u64::MAX);
    if window_ns == 0 {
        return Duration::ZERO;
    }
    let unit = rng.next_unit();
    let unit = if unit.is_finite() { unit.clamp(0.0, 1.0) } else { 0.0 };
    // Keep the window half-open even if the source returns exactly 1.0.
    let offset_ns = ((window_ns as f64 * unit) as u64).min(window_ns - 1);
    Duration::from_nanos(offset_ns)
}
