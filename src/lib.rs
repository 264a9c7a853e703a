/*!
 * Rolegate
 * Role-based mediation of sensitive operations with hot-swappable policy
 *
 * Rolegate authorizes intercepted operations (file access, port binding,
 * signal delivery, ptrace attachment) against an in-memory role store, and
 * hands denial events to a privileged monitor through a single-slot
 * blocking channel.
 *
 * ## Features
 * - Per-role compiled rule indexes for O(1)-ish hot-path decisions
 * - Atomic, all-or-nothing policy reload; in-flight decisions keep their
 *   generation snapshot
 * - Default-deny closure: anything unmatched resolves to Deny
 * - Interruptible waits throughout (decision path and audit consumer)
 *
 * ## Usage
 * ```ignore
 * use rolegate::{AuditChannel, CancelToken, DecisionEngine, JsonPolicyLoader,
 *                ReloadCoordinator, ReloadFlags, RoleStore};
 * use std::sync::Arc;
 *
 * let store = RoleStore::new();
 * let flags = Arc::new(ReloadFlags::new());
 * let audit = Arc::new(AuditChannel::new());
 *
 * let engine = DecisionEngine::new(store.clone(), Arc::clone(&flags), Arc::clone(&audit));
 * let coordinator = ReloadCoordinator::new(
 *     store,
 *     flags,
 *     Arc::new(JsonPolicyLoader::from_path("/etc/rolegate/policy.json")),
 * );
 *
 * coordinator.reload()?;
 * if engine.check_port_bind(8080, &CancelToken::new())?.is_allowed() {
 *     // perform the bind
 * }
 * ```
 */

pub mod audit;
pub mod core;
pub mod policy;
pub mod telemetry;

// Re-exports
pub use crate::audit::{AuditChannel, AuditEvent, AuditStats, DenialLedger};
pub use crate::core::{CancelToken, FileId, Generation, Interrupted, LoadError, Pid, Port, Signal};
pub use crate::policy::{
    AccessMask, Decision, DecisionEngine, JsonPolicyLoader, PermissionIndex, PolicyConfig, Reason,
    ReloadCoordinator, ReloadFlags, ReloadReport, ResourceClass, Role, RoleBundle, RoleLoader,
    RoleStore, Rule, RuleOrigin, SignalSet, Target, Verdict, EMPTY_ROLE,
};
pub use crate::telemetry::init_tracing;
