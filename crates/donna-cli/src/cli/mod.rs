//! CLI for the DONNA reconnect policy.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use donna_core::config::{self, DonnaConfig};
use donna_core::reconnect::FailureSignal;
use donna_core::session::ScriptStep;
use std::path::PathBuf;

use commands::{
    run_classify, run_completions, run_decide, run_delay, run_man, run_show_config, run_simulate,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "donna")]
#[command(about = "DONNA: realtime session reconnect policy tools", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/donna/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the backoff schedule for the configured policy.
    Delay {
        /// Number of attempts to print.
        #[arg(long, default_value = "10", value_name = "N")]
        attempts: u32,
        /// Seed the jitter RNG for a reproducible schedule.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Classify an error message as retriable or fatal.
    Classify {
        /// Error message, e.g. "WebSocket connection error".
        message: String,
    },

    /// Decide whether to reconnect after attempt N failed.
    Decide {
        /// The attempt that just failed (1-based).
        #[arg(long, value_name = "N")]
        attempt: u32,

        #[command(flatten)]
        signal: SignalArgs,

        /// Seed the jitter RNG.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run the connection manager against scripted outcomes.
    ///
    /// Steps: ok, ok:<code>, close:<code>, error:<message>, absent.
    Simulate {
        /// Outcomes, one per connect attempt.
        #[arg(required = true, value_name = "STEP")]
        steps: Vec<ScriptStep>,
        /// Seed the jitter RNG.
        #[arg(long)]
        seed: Option<u64>,
        /// How long a session that stays open is held before aborting.
        #[arg(long, default_value = "1000", value_name = "MS")]
        hold_ms: u64,
    },

    /// Show the effective configuration.
    Config,

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },

    /// Print the man page (roff) to stdout.
    Man,
}

/// Exactly one way of describing the failure.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct SignalArgs {
    /// WebSocket close code.
    #[arg(long)]
    pub code: Option<u16>,
    /// Error message.
    #[arg(long)]
    pub message: Option<String>,
    /// Raw JSON value: null, a string, {"code": ..} or {"message": ..}.
    #[arg(long)]
    pub json: Option<String>,
}

impl SignalArgs {
    pub fn to_signal(&self) -> Result<FailureSignal> {
        if let Some(code) = self.code {
            return Ok(FailureSignal::close(code));
        }
        if let Some(message) = &self.message {
            return Ok(FailureSignal::error(message.as_str()));
        }
        match &self.json {
            Some(raw) => {
                let value: serde_json::Value = serde_json::from_str(raw)?;
                Ok(FailureSignal::from_json(&value))
            }
            None => Ok(FailureSignal::Absent),
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<(DonnaConfig, PathBuf)> {
    match path {
        Some(p) => Ok((config::load_from_path(p)?, p.clone())),
        None => Ok((config::load_or_init()?, config::config_path()?)),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        // These need no config.
        match &cli.command {
            CliCommand::Completions { shell } => return run_completions(*shell),
            CliCommand::Man => return run_man(),
            CliCommand::Classify { message } => return run_classify(message),
            _ => {}
        }

        let (cfg, cfg_path) = load_config(cli.config.as_ref())?;
        tracing::debug!("loaded config: {:?}", cfg);
        let policy = cfg.reconnect_policy()?;

        match cli.command {
            CliCommand::Delay { attempts, seed } => run_delay(&policy, attempts, seed),
            CliCommand::Decide {
                attempt,
                signal,
                seed,
            } => run_decide(&policy, attempt, &signal.to_signal()?, seed),
            CliCommand::Simulate {
                steps,
                seed,
                hold_ms,
            } => run_simulate(&cfg.effective_websocket_url(), policy, steps, seed, hold_ms).await,
            CliCommand::Config => run_show_config(&cfg, &cfg_path),
            CliCommand::Completions { .. } | CliCommand::Man | CliCommand::Classify { .. } => {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests;
