//! Realtime session lifecycle: connect, hold, and reconnect under the
//! [`ReconnectPolicy`](crate::reconnect::ReconnectPolicy).
//!
//! ```text
//! Idle ─► Connecting ─► Connected ─(drop)─► RetryWait ─► Connecting ─► …
//!              │                               ▲
//!              └──────────(failure)────────────┘
//!                         └─(policy says stop)─► Failed
//! ```

mod connector;
mod control;
mod error;
mod manager;
mod state;

pub use connector::{Connector, ParseStepError, ScriptStep, ScriptedConnector, ScriptedSession};
pub use control::AbortHandle;
pub use error::SessionError;
pub use manager::ConnectionManager;
pub use state::{ConnectionState, Disconnect, StateChange};
