use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::reconnect::{BackoffConfig, ConfigError, ReconnectPolicy};

/// Environment variable that overrides `websocket_url` (same name the web
/// client reads).
pub const WEBSOCKET_URL_ENV: &str = "NEXT_PUBLIC_WEBSOCKET_URL";

const DEFAULT_WEBSOCKET_URL: &str = "ws://localhost:3001/realtime";

/// Reconnect parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Maximum number of attempts per failure cycle (including the first).
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Cap on the exponential term in milliseconds.
    pub cap_delay_ms: u64,
    /// Width of the additive jitter window in milliseconds.
    pub jitter_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 500,
            cap_delay_ms: 5000,
            jitter_ms: 250,
        }
    }
}

impl ReconnectConfig {
    /// Validate and convert into a policy.
    pub fn to_policy(&self) -> Result<ReconnectPolicy, ConfigError> {
        let backoff = BackoffConfig::from_millis(self.base_delay_ms, self.cap_delay_ms, self.jitter_ms)?;
        ReconnectPolicy::new(backoff, self.max_attempts)
    }
}

fn default_websocket_url() -> String {
    DEFAULT_WEBSOCKET_URL.to_string()
}

/// Global configuration loaded from `~/.config/donna/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonnaConfig {
    /// Realtime relay endpoint.
    #[serde(default = "default_websocket_url")]
    pub websocket_url: String,
    /// Optional reconnect policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub reconnect: Option<ReconnectConfig>,
}

impl Default for DonnaConfig {
    fn default() -> Self {
        Self {
            websocket_url: default_websocket_url(),
            reconnect: None,
        }
    }
}

impl DonnaConfig {
    pub fn reconnect_policy(&self) -> Result<ReconnectPolicy, ConfigError> {
        self.reconnect.clone().unwrap_or_default().to_policy()
    }

    /// Endpoint to dial: a non-empty `NEXT_PUBLIC_WEBSOCKET_URL` wins over the file.
    pub fn effective_websocket_url(&self) -> String {
        self.websocket_url_with_override(std::env::var(WEBSOCKET_URL_ENV).ok())
    }

    fn websocket_url_with_override(&self, env: Option<String>) -> String {
        match env {
            Some(url) if !url.trim().is_empty() => url,
            _ => self.websocket_url.clone(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("donna")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DonnaConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DonnaConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path. The reconnect section is
/// validated here so bad constants fail at startup, not on the first drop.
pub fn load_from_path(path: &Path) -> Result<DonnaConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: DonnaConfig = toml::from_str(&data)?;
    cfg.reconnect_policy()?;
    Ok(cfg)
}
