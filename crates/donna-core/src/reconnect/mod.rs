//! Reconnect policy for the realtime voice/text session.
//!
//! This module encapsulates failure classification (network drops, timeouts,
//! close codes) and capped exponential backoff so that every connection
//! manager shares one consistent decision about when to retry, how long to
//! wait, and when to give up. Nothing in here holds state between calls.

mod backoff;
mod classify;
mod error;
mod jitter;
mod policy;
mod signal;

pub use backoff::{compute_next_delay, get_retry_delay, BackoffConfig};
pub use classify::{
    classify, classify_close_code, classify_message, is_retriable_error, CloseClass, FailureKind,
};
pub use error::ConfigError;
pub use jitter::{FixedJitter, JitterSource, RngJitter, ThreadJitter};
pub use policy::{should_retry, ReconnectPolicy, RetryDecision, StopReason};
pub use signal::{close_code, FailureSignal};
