//! `donna delay` – print the backoff schedule.

use anyhow::Result;
use donna_core::reconnect::ReconnectPolicy;

use super::jitter_source;

pub fn run_delay(policy: &ReconnectPolicy, attempts: u32, seed: Option<u64>) -> Result<()> {
    let mut jitter = jitter_source(seed);
    let backoff = &policy.backoff;
    println!(
        "base={}ms cap={}ms jitter={}ms max_attempts={}",
        backoff.base_delay.as_millis(),
        backoff.cap_delay.as_millis(),
        backoff.jitter.as_millis(),
        policy.max_attempts
    );
    println!("{:<8} {:<10} {}", "ATTEMPT", "FLOOR_MS", "DELAY_MS");
    for attempt in 1..=attempts {
        let floor = backoff.delay_floor(attempt);
        let delay = backoff.next_delay(attempt, &mut jitter);
        let marker = if attempt >= policy.max_attempts { "  (budget exhausted)" } else { "" };
        println!(
            "{:<8} {:<10} {}{}",
            attempt,
            floor.as_millis(),
            delay.as_millis(),
            marker
        );
    }
    Ok(())
}
