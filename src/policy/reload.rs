/*!
 * Reload Coordinator
 * Serializes role reloads against in-flight decisions
 *
 * State machine: Idle → Reloading → Idle. Entering Reloading acquires the
 * store's exclusive write section and raises a process-wide flag consulted
 * by the decision engine's fast path; while it is up, file-permission
 * enforcement is suspended so that reading the policy source is not itself
 * permission-checked: the reload must not depend on the very policy it is
 * replacing. The flag is set and cleared only while the lock is held
 * (release ordering), so no thread can observe the flag without also
 * observing the lock state that justifies it.
 *
 * Reload steps: reset to default-deny, invoke the loader collaborator,
 * install the produced role set. If the loader fails, the store stays at
 * its reset state (fail-safe, not fail-open) and the error is returned
 * to the privileged caller. Reloads serialize on the write lock: a second
 * trigger blocks until the first finishes; none are dropped, none are
 * reentrant or cancellable.
 */

use crate::core::errors::LoadError;
use crate::core::types::Generation;
use crate::policy::loader::RoleLoader;
use crate::policy::store::RoleStore;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide reload state consulted by the decision fast path.
#[derive(Debug, Default)]
pub struct ReloadFlags {
    reloading: AtomicBool,
}

impl ReloadFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading.load(Ordering::Acquire)
    }

    /// Raise the flag for the duration of the returned guard. Must only be
    /// called while holding the store's write section.
    pub(crate) fn enter(&self) -> ReloadWindow<'_> {
        self.reloading.store(true, Ordering::Release);
        ReloadWindow { flags: self }
    }
}

/// RAII guard that lowers the reloading flag on every exit path.
pub(crate) struct ReloadWindow<'a> {
    flags: &'a ReloadFlags,
}

impl Drop for ReloadWindow<'_> {
    fn drop(&mut self) {
        self.flags.reloading.store(false, Ordering::Release);
    }
}

/// Summary of a completed reload, returned to the privileged trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadReport {
    pub generation: Generation,
    pub roles_loaded: usize,
    pub active_role: String,
}

pub struct ReloadCoordinator {
    store: RoleStore,
    flags: Arc<ReloadFlags>,
    loader: Arc<dyn RoleLoader>,
}

impl ReloadCoordinator {
    pub fn new(store: RoleStore, flags: Arc<ReloadFlags>, loader: Arc<dyn RoleLoader>) -> Self {
        Self {
            store,
            flags,
            loader,
        }
    }

    /// Run one full reload cycle.
    ///
    /// On failure the store is left default-deny and every subsequent
    /// decision denies until a later reload succeeds.
    pub fn reload(&self) -> Result<ReloadReport, LoadError> {
        // Guard declaration order matters: `window` drops before `table`,
        // so the flag is lowered while the lock is still held.
        let mut table = self.store.write_section();
        let window = self.flags.enter();

        table.reset();

        let bundle = match self.loader.load_roles() {
            Ok(bundle) => bundle,
            Err(err) => {
                warn!("role reload failed, store left default-deny: {}", err);
                return Err(err);
            }
        };

        table.replace_all(bundle.roles, &bundle.active_role)?;

        for role in table.roles() {
            debug!("loaded role '{}' ({} rule(s))", role.name(), role.rules().len());
        }

        let report = ReloadReport {
            generation: table.generation(),
            roles_loaded: table.len(),
            active_role: table.active().name().to_string(),
        };
        info!(
            "role reload complete: {} role(s), active '{}', generation {}",
            report.roles_loaded, report.active_role, report.generation
        );

        drop(window);
        Ok(report)
    }
}
