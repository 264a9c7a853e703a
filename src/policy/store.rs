/*!
 * Role Store
 * Owns the loaded role set and the active-role binding
 *
 * Concurrency discipline: multi-reader/single-writer. Any number of lookups
 * run concurrently under the read lock; `reset`/`replace_all` are write-guard
 * methods, so mutation is only possible while holding the exclusive section
 * the reload coordinator acquires. All critical sections are RAII guards;
 * there is no unlock call to forget on an error path.
 *
 * Readers clone the `Arc<Role>` they need inside the read section and drop
 * the guard; a decision in flight therefore observes its generation to
 * completion even if a reload swaps the table underneath it. No fairness
 * guarantee is made beyond what parking_lot provides.
 */

use crate::core::errors::{Interrupted, LoadError};
use crate::core::limits::{DEFAULT_ROLE_CAPACITY, ROLE_READ_RETRY};
use crate::core::sync::CancelToken;
use crate::core::types::Generation;
use crate::policy::types::Role;
use ahash::RandomState;
use log::{debug, warn};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::sync::Arc;

/// The role table for one load generation.
///
/// Mutating methods take `&mut self` and are reachable only through the
/// store's exclusive write section.
#[derive(Debug)]
pub struct RoleTable {
    roles: HashMap<Arc<str>, Arc<Role>, RandomState>,
    active: Arc<Role>,
    empty: Arc<Role>,
    generation: Generation,
}

impl RoleTable {
    fn seeded() -> Self {
        let empty = Arc::new(Role::empty());
        let mut roles =
            HashMap::with_capacity_and_hasher(DEFAULT_ROLE_CAPACITY, RandomState::new());
        roles.insert(empty.name_arc(), Arc::clone(&empty));
        Self {
            roles,
            active: Arc::clone(&empty),
            empty,
            generation: 0,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Role>> {
        self.roles.get(name).cloned()
    }

    /// The role decisions are evaluated against. Never absent: falls back to
    /// the built-in empty (default-deny) role.
    pub fn active(&self) -> Arc<Role> {
        Arc::clone(&self.active)
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn roles(&self) -> impl Iterator<Item = &Arc<Role>> {
        self.roles.values()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Drop every loaded role and bind the empty role as active.
    ///
    /// Runs at the start of a reload so that an interrupted reload leaves
    /// the system default-deny, never with a stale generation.
    pub fn reset(&mut self) {
        self.roles.clear();
        self.roles
            .insert(self.empty.name_arc(), Arc::clone(&self.empty));
        self.active = Arc::clone(&self.empty);
        self.generation += 1;
        debug!("role table reset to default-deny (generation {})", self.generation);
    }

    /// Atomically install a new generation.
    ///
    /// All-or-nothing: validation happens against a staging map, and the
    /// table is untouched when an error is returned. A missing active role
    /// is not an error: the empty role is bound instead.
    pub fn replace_all(&mut self, roles: Vec<Role>, active_name: &str) -> Result<(), LoadError> {
        if roles.is_empty() {
            return Err(LoadError::EmptyRoleSet);
        }

        let mut staged: HashMap<Arc<str>, Arc<Role>, RandomState> =
            HashMap::with_capacity_and_hasher(roles.len(), RandomState::new());
        for role in roles {
            let role = Arc::new(role);
            if staged.insert(role.name_arc(), Arc::clone(&role)).is_some() {
                return Err(LoadError::DuplicateRole(role.name().to_string()));
            }
        }

        let active = match staged.get(active_name) {
            Some(role) => Arc::clone(role),
            None => {
                warn!(
                    "active role '{}' not present in loaded set, falling back to default-deny",
                    active_name
                );
                Arc::clone(&self.empty)
            }
        };

        self.roles = staged;
        self.active = active;
        self.generation += 1;
        debug!(
            "installed {} role(s), active '{}' (generation {})",
            self.roles.len(),
            self.active.name(),
            self.generation
        );
        Ok(())
    }
}

/// Shared handle to the role table.
///
/// Cheap to clone; all clones address the same table. Read-path methods
/// acquire the read section internally, so callers never manage locks.
#[derive(Debug, Clone)]
pub struct RoleStore {
    table: Arc<RwLock<RoleTable>>,
}

impl RoleStore {
    /// Create a store seeded with only the built-in empty role.
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(RoleTable::seeded())),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Role>> {
        self.table.read().lookup(name)
    }

    pub fn active_role(&self) -> Arc<Role> {
        self.table.read().active()
    }

    pub fn generation(&self) -> Generation {
        self.table.read().generation()
    }

    /// Interruptibly enter the shared read section.
    ///
    /// Acquisition retries at a bounded interval so a caller-abort is
    /// observed even while a reload holds the write lock.
    pub(crate) fn read_section(
        &self,
        token: &CancelToken,
    ) -> Result<RwLockReadGuard<'_, RoleTable>, Interrupted> {
        loop {
            if token.is_cancelled() {
                return Err(Interrupted);
            }
            if let Some(guard) = self.table.try_read_for(ROLE_READ_RETRY) {
                return Ok(guard);
            }
        }
    }

    /// Enter the exclusive write section, blocking out readers and other
    /// writers for the guard's lifetime.
    pub(crate) fn write_section(&self) -> RwLockWriteGuard<'_, RoleTable> {
        self.table.write()
    }
}

impl Default for RoleStore {
    fn default() -> Self {
        Self::new()
    }
}
