//! `donna config` – show the effective configuration.

use anyhow::Result;
use donna_core::config::{DonnaConfig, WEBSOCKET_URL_ENV};
use std::path::Path;

pub fn run_show_config(cfg: &DonnaConfig, path: &Path) -> Result<()> {
    let policy = cfg.reconnect_policy()?;
    println!("config:        {}", path.display());
    println!("websocket_url: {}", cfg.effective_websocket_url());
    if std::env::var_os(WEBSOCKET_URL_ENV).is_some() {
        println!("               (from {})", WEBSOCKET_URL_ENV);
    }
    println!("max_attempts:  {}", policy.max_attempts);
    println!("base_delay:    {}ms", policy.backoff.base_delay.as_millis());
    println!("cap_delay:     {}ms", policy.backoff.cap_delay.as_millis());
    println!("jitter:        {}ms", policy.backoff.jitter.as_millis());
    Ok(())
}
