/*!
 * Policy Module
 * Role store, compiled permission indexes, decision engine, and reload protocol
 *
 * This is the mediation core: intercepted operations are authorized against
 * the currently active role, and the role set can be hot-swapped without
 * blocking in-flight decisions for more than a bounded critical section.
 *
 * ## Usage
 * ```ignore
 * use rolegate::policy::{DecisionEngine, ReloadCoordinator, ReloadFlags, RoleStore};
 * use rolegate::policy::loader::JsonPolicyLoader;
 * use rolegate::audit::AuditChannel;
 * use rolegate::core::CancelToken;
 * use std::sync::Arc;
 *
 * let store = RoleStore::new();
 * let flags = Arc::new(ReloadFlags::new());
 * let audit = Arc::new(AuditChannel::new());
 *
 * let engine = DecisionEngine::new(store.clone(), Arc::clone(&flags), Arc::clone(&audit));
 * let loader = Arc::new(JsonPolicyLoader::from_path("/etc/rolegate/policy.json"));
 * let coordinator = ReloadCoordinator::new(store, flags, loader);
 *
 * coordinator.reload()?;
 * let decision = engine.check_port_bind(8080, &CancelToken::new())?;
 * ```
 */

pub mod engine;
pub mod index;
pub mod loader;
pub mod reload;
pub mod store;
pub mod types;

// Re-export commonly used items
pub use engine::DecisionEngine;
pub use index::PermissionIndex;
pub use loader::{JsonPolicyLoader, PolicyConfig, RoleBundle, RoleLoader};
pub use reload::{ReloadCoordinator, ReloadFlags, ReloadReport};
pub use store::{RoleStore, RoleTable};
pub use types::{
    AccessMask, Decision, Reason, ResourceClass, Role, Rule, RuleOrigin, SignalSet, Target,
    Verdict, EMPTY_ROLE,
};
