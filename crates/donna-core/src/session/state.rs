//! Connection states and transition events.

use std::fmt;
use std::time::Duration;

use crate::reconnect::StopReason;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    /// Attempt `attempt` (1-based within the current failure cycle) in flight.
    Connecting { attempt: u32 },
    Connected,
    /// Waiting `delay` after attempt `attempt` failed.
    RetryWait { attempt: u32, delay: Duration },
    /// Terminal: the policy refused another attempt.
    Failed { attempts: u32, reason: StopReason },
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Failed { .. })
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connecting { attempt } => write!(f, "connecting (attempt {})", attempt),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::RetryWait { attempt, delay } => {
                write!(f, "retry wait {}ms after attempt {}", delay.as_millis(), attempt)
            }
            ConnectionState::Failed { attempts, reason } => {
                write!(f, "failed after {} attempt(s): {}", attempts, reason)
            }
        }
    }
}

/// Emitted on every transition when the manager has an event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub previous: ConnectionState,
    pub current: ConnectionState,
}

/// How [`run`](super::ConnectionManager::run) ended without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// A connected session was closed on purpose (1000 / 1001).
    Clean { code: u16 },
    /// The abort handle fired.
    Aborted,
}
