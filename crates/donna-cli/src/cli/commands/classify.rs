//! `donna classify` – show how an error message is classified.

use anyhow::Result;
use donna_core::reconnect::classify_message;

pub fn run_classify(message: &str) -> Result<()> {
    let kind = classify_message(message);
    let verdict = if kind.is_retriable() { "retriable" } else { "not retriable" };
    println!("{:<10} {}", kind.as_label(), verdict);
    Ok(())
}
