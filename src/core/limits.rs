/*!
 * System Limits and Constants
 *
 * Centralized location for crate-wide limits and thresholds.
 * All values include rationale comments explaining WHY they exist.
 */

use std::time::Duration;

// =============================================================================
// AUDIT LIMITS
// =============================================================================

/// Maximum stored audit message length (1KB)
/// Messages published to the single-slot channel are truncated to this bound
/// before being stored, so the slot never holds unbounded producer input.
pub const MAX_AUDIT_MESSAGE: usize = 1024;

/// Poll interval for the blocking audit consumer (50ms)
/// The consumer re-checks its cancellation token at this cadence, bounding
/// how long a cancelled wait can linger before returning Interrupted.
pub const AUDIT_WAIT_POLL: Duration = Duration::from_millis(50);

// =============================================================================
// POLICY LIMITS
// =============================================================================

/// Retry interval for interruptible read-lock acquisition (10ms)
/// Bounds cancellation latency on the decision path while a reload holds the
/// write lock.
pub const ROLE_READ_RETRY: Duration = Duration::from_millis(10);

/// Highest valid signal number (Linux real-time signal ceiling)
/// Signal sets are fixed-width bitmasks sized to this bound.
pub const MAX_SIGNAL: u32 = 64;

/// Initial capacity for role tables
/// Deployments carry a handful of roles; avoids rehashing during a reload.
pub const DEFAULT_ROLE_CAPACITY: usize = 16;
