/*!
 * Audit Channel
 * Single-slot overwrite mailbox with a blocking consumer
 *
 * This is deliberately not a queue: the slot holds at most one message and
 * a publish overwrites whatever is still unread (latest-value-wins; lost
 * messages are a documented trade-off, not a bug). The consumer blocks on a
 * condition variable whose wake predicate is the occupied slot; spurious
 * wakeups are tolerated by re-checking the predicate, and a cancellation
 * token aborts the wait without consuming or leaving the slot half-read.
 *
 * Designed for many producers and a single consumer. With multiple
 * consumers waiting, exactly one is woken per publish; anything beyond
 * that is unsupported.
 */

use crate::core::errors::Interrupted;
use crate::core::limits::{AUDIT_WAIT_POLL, MAX_AUDIT_MESSAGE};
use crate::core::sync::CancelToken;
use log::debug;
use parking_lot::{Condvar, Mutex};

pub struct AuditChannel {
    slot: Mutex<Option<Vec<u8>>>,
    ready: Condvar,
}

impl AuditChannel {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Store a message, overwriting any unconsumed one, and wake at most
    /// one blocked consumer. Messages are truncated to the channel bound.
    pub fn publish(&self, message: &[u8]) {
        let bounded = &message[..message.len().min(MAX_AUDIT_MESSAGE)];
        let mut slot = self.slot.lock();
        if slot.replace(bounded.to_vec()).is_some() {
            debug!("audit slot overwritten before consumption");
        }
        self.ready.notify_one();
    }

    /// Retrieve and clear the pending message, blocking until one is
    /// published. At most `max_len` bytes are returned; a longer message is
    /// truncated silently; truncation is the contract, not an error.
    pub fn consume(&self, max_len: usize, token: &CancelToken) -> Result<Vec<u8>, Interrupted> {
        let mut slot = self.slot.lock();
        loop {
            if let Some(mut message) = slot.take() {
                message.truncate(max_len);
                return Ok(message);
            }
            if token.is_cancelled() {
                return Err(Interrupted);
            }
            // Bounded wait so a cancelled token is observed promptly even
            // without a paired wakeup.
            let _ = self.ready.wait_for(&mut slot, AUDIT_WAIT_POLL);
        }
    }

    /// Whether a message is pending. Snapshot only; the slot may change the
    /// moment the lock is released.
    pub fn is_ready(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl Default for AuditChannel {
    fn default() -> Self {
        Self::new()
    }
}
