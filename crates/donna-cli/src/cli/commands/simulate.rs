//! `donna simulate` – drive the connection manager with scripted outcomes.

use anyhow::Result;
use donna_core::reconnect::ReconnectPolicy;
use donna_core::session::{
    AbortHandle, ConnectionManager, ConnectionState, Disconnect, ScriptStep, ScriptedConnector,
    StateChange,
};
use std::time::Duration;
use tokio::sync::mpsc;

use super::jitter_source;

pub async fn run_simulate(
    url: &str,
    policy: ReconnectPolicy,
    steps: Vec<ScriptStep>,
    seed: Option<u64>,
    hold_ms: u64,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<StateChange>(32);
    let mut manager = ConnectionManager::new(url, policy, ScriptedConnector::new(steps))
        .with_jitter(jitter_source(seed))
        .with_events(tx);

    let printer = tokio::spawn(print_transitions(
        rx,
        manager.abort_handle(),
        Duration::from_millis(hold_ms),
    ));

    let result = manager.run().await;
    let connects = manager.connector().connects();
    // Dropping the manager closes the event channel so the printer exits.
    drop(manager);
    let _ = printer.await;

    match result {
        Ok(Disconnect::Clean { code }) => {
            println!("session closed cleanly with {} after {} connect(s)", code, connects);
            Ok(())
        }
        Ok(Disconnect::Aborted) => {
            println!("session held open, then aborted after {} connect(s)", connects);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(label = e.as_label(), "simulation ended in failed state");
            Err(e.into())
        }
    }
}

/// Print each transition. A session that stays connected for `hold` with no
/// further transition is aborted so the simulation terminates.
async fn print_transitions(
    mut rx: mpsc::Receiver<StateChange>,
    abort: AbortHandle,
    hold: Duration,
) {
    let mut connected = false;
    loop {
        let change = if connected {
            tokio::select! {
                change = rx.recv() => change,
                _ = tokio::time::sleep(hold) => {
                    abort.abort();
                    rx.recv().await
                }
            }
        } else {
            rx.recv().await
        };
        let Some(change) = change else { break };
        println!("  {:<14} -> {}", short(&change.previous), change.current);
        connected = change.current == ConnectionState::Connected;
    }
}

fn short(state: &ConnectionState) -> &'static str {
    match state {
        ConnectionState::Idle => "idle",
        ConnectionState::Connecting { .. } => "connecting",
        ConnectionState::Connected => "connected",
        ConnectionState::RetryWait { .. } => "retry_wait",
        ConnectionState::Failed { .. } => "failed",
    }
}
