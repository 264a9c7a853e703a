/*!
 * Audit Module
 * Denial events, the single-slot monitor channel, and denial counters
 *
 * Routine denials are reported here rather than through caller-visible
 * errors, so a denied process learns nothing about policy structure. The
 * privileged monitor retrieves formatted events with a blocking read that
 * maps 1:1 onto `AuditChannel::consume`.
 */

pub mod channel;
pub mod stats;

pub use channel::AuditChannel;
pub use stats::{AuditStats, DenialLedger};

use crate::core::types::{FileId, Pid, Port, Signal};
use crate::policy::types::{AccessMask, ResourceClass};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// A denied operation, formatted for the monitor.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditEvent {
    pub class: ResourceClass,
    pub role: Arc<str>,
    pub detail: String,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub at: SystemTime,
}

impl AuditEvent {
    fn new(class: ResourceClass, role: Arc<str>, detail: String) -> Self {
        Self {
            class,
            role,
            detail,
            at: SystemTime::now(),
        }
    }

    pub fn file_denied(file: FileId, requested: AccessMask, role: Arc<str>) -> Self {
        Self::new(
            ResourceClass::FileAccess,
            role,
            format!("invalid access to file {} (requested {})", file, requested),
        )
    }

    pub fn port_denied(port: Port, role: Arc<str>) -> Self {
        Self::new(
            ResourceClass::PortBind,
            role,
            format!("invalid bind to port {}", port),
        )
    }

    pub fn signal_denied(pid: Pid, file: FileId, signal: Signal, role: Arc<str>) -> Self {
        Self::new(
            ResourceClass::SignalSend,
            role,
            format!("invalid signal {} to pid {}, file {}", signal, pid, file),
        )
    }

    pub fn trace_denied(pid: Pid, file: FileId, role: Arc<str>) -> Self {
        Self::new(
            ResourceClass::TraceAttach,
            role,
            format!("invalid trace to pid {}, file {}", pid, file),
        )
    }

    /// Wire form handed to the channel: one text line.
    pub fn render(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deny {} role={}: {}", self.class, self.role, self.detail)
    }
}
