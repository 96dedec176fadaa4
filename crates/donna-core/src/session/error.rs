use thiserror::Error;

use crate::reconnect::{FailureSignal, StopReason};

/// Errors produced by the connection manager.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The policy refused another attempt; the session is in the terminal state.
    #[error("realtime session failed after {attempts} attempt(s): {reason} (last failure: {last})")]
    Failed {
        attempts: u32,
        reason: StopReason,
        last: FailureSignal,
    },
}

impl SessionError {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SessionError::Failed { reason, .. } => reason.as_label(),
        }
    }
}
