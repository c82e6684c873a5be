//! Cancellation signal threaded through to the transport

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Default)]
struct AbortInner {
    aborted: AtomicBool,
    notify: Notify,
}

/// Cloneable abort flag that can also be awaited
#[derive(Clone, Default)]
pub struct AbortSignal(Arc<AbortInner>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; wakes every task waiting in [`cancelled`](Self::cancelled)
    pub fn abort(&self) {
        self.0.aborted.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    pub fn is_aborted(&self) -> bool {
        self.0.aborted.load(Ordering::SeqCst)
    }

    /// Clear the flag so the signal can guard a new operation
    pub fn reset(&self) {
        self.0.aborted.store(false, Ordering::SeqCst);
    }

    /// Resolves once [`abort`](Self::abort) has been called
    pub async fn cancelled(&self) {
        loop {
            let notified = self.0.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortSignal")
            .field("aborted", &self.is_aborted())
            .finish()
    }
}
