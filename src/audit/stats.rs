/*!
 * Denial Ledger
 * Counters over denied operations for monitor-side queries
 */

use crate::policy::types::ResourceClass;
use ahash::RandomState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tracks denials by role and by resource class.
///
/// Keyed by role name rather than role object, so counts survive reloads
/// that rebuild the role set under the same names.
pub struct DenialLedger {
    by_role: DashMap<Arc<str>, u64, RandomState>,
    file: AtomicU64,
    port: AtomicU64,
    signal: AtomicU64,
    trace: AtomicU64,
}

impl DenialLedger {
    pub fn new() -> Self {
        Self {
            by_role: DashMap::with_hasher(RandomState::new()),
            file: AtomicU64::new(0),
            port: AtomicU64::new(0),
            signal: AtomicU64::new(0),
            trace: AtomicU64::new(0),
        }
    }

    pub fn record(&self, class: ResourceClass, role: &Arc<str>) {
        match class {
            ResourceClass::FileAccess => self.file.fetch_add(1, Ordering::Relaxed),
            ResourceClass::PortBind => self.port.fetch_add(1, Ordering::Relaxed),
            ResourceClass::SignalSend => self.signal.fetch_add(1, Ordering::Relaxed),
            ResourceClass::TraceAttach => self.trace.fetch_add(1, Ordering::Relaxed),
        };

        self.by_role
            .entry(Arc::clone(role))
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    pub fn denials_for_role(&self, role: &str) -> u64 {
        self.by_role.get(role).map(|entry| *entry).unwrap_or(0)
    }

    pub fn roles_with_denials(&self) -> Vec<(Arc<str>, u64)> {
        self.by_role
            .iter()
            .map(|entry| (Arc::clone(entry.key()), *entry.value()))
            .collect()
    }

    pub fn clear(&self) {
        self.by_role.clear();
        self.file.store(0, Ordering::Relaxed);
        self.port.store(0, Ordering::Relaxed);
        self.signal.store(0, Ordering::Relaxed);
        self.trace.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> AuditStats {
        let file_denials = self.file.load(Ordering::Relaxed);
        let port_denials = self.port.load(Ordering::Relaxed);
        let signal_denials = self.signal.load(Ordering::Relaxed);
        let trace_denials = self.trace.load(Ordering::Relaxed);

        AuditStats {
            total_denials: file_denials + port_denials + signal_denials + trace_denials,
            file_denials,
            port_denials,
            signal_denials,
            trace_denials,
            roles_tracked: self.by_role.len(),
        }
    }
}

impl Default for DenialLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Denial statistics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub total_denials: u64,
    pub file_denials: u64,
    pub port_denials: u64,
    pub signal_denials: u64,
    pub trace_denials: u64,
    pub roles_tracked: usize,
}
