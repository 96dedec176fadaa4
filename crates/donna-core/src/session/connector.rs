//! Transport seam for the connection manager.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::str::FromStr;
use thiserror::Error;

use crate::reconnect::FailureSignal;

/// Opens realtime sessions and reports how they end.
///
/// Implementations own the actual WebSocket; the manager only sees
/// [`FailureSignal`]s.
#[async_trait]
pub trait Connector: Send {
    type Session: Send;

    /// Open a session to `url`. A failed handshake is reported as a signal.
    async fn connect(&mut self, url: &str) -> Result<Self::Session, FailureSignal>;

    /// Resolve when an open session closes or drops.
    async fn wait_closed(&mut self, session: &mut Self::Session) -> FailureSignal;
}

/// One scripted connection outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// The connect attempt fails with this signal.
    Fail(FailureSignal),
    /// The connect succeeds; the session later ends with `close`, or stays
    /// open forever when `None`.
    Open { close: Option<FailureSignal> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid script step {0:?}: expected ok, ok:<code>, close:<code>, error:<message> or absent")]
pub struct ParseStepError(String);

impl FromStr for ScriptStep {
    type Err = ParseStepError;

    /// `ok`, `ok:<code>` (opens, then closes with code), `close:<code>`,
    /// `error:<message>`, `absent`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseStepError(s.to_string());
        let parse_code = |c: &str| c.trim().parse::<u16>().map_err(|_| bad());
        match s.split_once(':') {
            None if s == "ok" => Ok(ScriptStep::Open { close: None }),
            None if s == "absent" => Ok(ScriptStep::Fail(FailureSignal::Absent)),
            Some(("ok", code)) => Ok(ScriptStep::Open {
                close: Some(FailureSignal::close(parse_code(code)?)),
            }),
            Some(("close", code)) => Ok(ScriptStep::Fail(FailureSignal::close(parse_code(code)?))),
            Some(("error", message)) if !message.is_empty() => {
                Ok(ScriptStep::Fail(FailureSignal::error(message)))
            }
            _ => Err(bad()),
        }
    }
}

/// Connector that replays a fixed list of outcomes. Connecting past the end of
/// the script fails with a non-retriable error.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    steps: VecDeque<ScriptStep>,
    connects: u32,
}

/// Session handle produced by [`ScriptedConnector`].
#[derive(Debug)]
pub struct ScriptedSession {
    close: Option<FailureSignal>,
}

impl ScriptedConnector {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            connects: 0,
        }
    }

    /// Number of connect calls made so far.
    pub fn connects(&self) -> u32 {
        self.connects
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Session = ScriptedSession;

    async fn connect(&mut self, url: &str) -> Result<ScriptedSession, FailureSignal> {
        self.connects += 1;
        tracing::trace!(url, connects = self.connects, "scripted connect");
        match self.steps.pop_front() {
            Some(ScriptStep::Fail(signal)) => Err(signal),
            Some(ScriptStep::Open { close }) => Ok(ScriptedSession { close }),
            None => Err(FailureSignal::error("scripted connector has no more steps")),
        }
    }

    async fn wait_closed(&mut self, session: &mut ScriptedSession) -> FailureSignal {
        match session.close.take() {
            Some(signal) => signal,
            None => std::future::pending().await,
        }
    }
}
