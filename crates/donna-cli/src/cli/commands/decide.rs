//! `donna decide` – evaluate the retry gate for one failure.

use anyhow::Result;
use donna_core::reconnect::{FailureSignal, ReconnectPolicy, RetryDecision};

use super::jitter_source;

pub fn run_decide(
    policy: &ReconnectPolicy,
    attempt: u32,
    signal: &FailureSignal,
    seed: Option<u64>,
) -> Result<()> {
    let mut jitter = jitter_source(seed);
    match policy.decide(signal, attempt, &mut jitter) {
        RetryDecision::RetryAfter(delay) => {
            println!("retry after {}ms ({})", delay.as_millis(), signal)
        }
        RetryDecision::NoRetry(reason) => println!("no retry: {} ({})", reason, signal),
    }
    Ok(())
}
