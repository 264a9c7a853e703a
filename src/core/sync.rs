/*!
 * Cancellation Support
 *
 * Blocking waits in this crate (the decision read path while a reload holds
 * the write lock, and the audit consumer) honor external interruption via a
 * shared token. Cancellation never leaks a lock: waiters poll the token at a
 * bounded interval and return through normal guard drops.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Caller-abort signal shared between a waiter and its controller.
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal every waiter holding a clone of this token to abort.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
