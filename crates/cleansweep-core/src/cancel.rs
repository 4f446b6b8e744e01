/// Explicit per-request cancellation tokens.
///
/// Every cancellable request (lock inspection, phase transition) receives its
/// own token at creation time. Holders of a clone may request cancellation;
/// the worker polls the flag between units of work and exits quietly.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply-cloneable cancellation flag scoped to one logical request.
///
/// Clones share the same underlying flag, so cancelling any clone cancels
/// the request everywhere it is observed.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Non-blocking; workers observe it on their
    /// next poll.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
