//! Abort signal for a running connection manager.
//!
//! The handle can be cloned and moved to whoever owns the session's lifetime
//! (UI teardown, shutdown hook). Aborting wakes a pending retry sleep or an
//! in-flight connect; the policy is not consulted again.

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct AbortHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    pub(crate) fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Request abort. Idempotent and permanent: the flag is never cleared.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Resolves once abort has been requested.
pub(crate) async fn aborted(rx: &mut watch::Receiver<bool>) {
    let closed = rx.wait_for(|flag| *flag).await.is_err();
    if closed {
        // Every handle is gone, so nobody can abort any more.
        std::future::pending::<()>().await;
    }
}
