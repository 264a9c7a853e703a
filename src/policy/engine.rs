/*!
 * Decision Engine
 * Authorizes intercepted operations against the active role
 *
 * One entry point per resource class. Each check: consults the reloading
 * fast path (file enforcement is suspended while roles reload, so the load
 * path cannot deadlock on its own policy source; see the reload module),
 * then enters the store's read section, snapshots the active role, queries
 * its compiled index, and resolves Allow or Deny with a reason naming the
 * rule (or the default) that produced the outcome.
 *
 * Checks never fail: apart from caller cancellation (`Interrupted`), every
 * call resolves to a decision. An unmediated operation with no ruling is a
 * worse outcome than a conservative default. Denials are pushed to the
 * audit channel and the denial ledger as a side effect; publishing never
 * blocks beyond the slot mutex.
 */

use crate::audit::{AuditChannel, AuditEvent, DenialLedger};
use crate::core::errors::Interrupted;
use crate::core::sync::CancelToken;
use crate::core::types::{FileId, Pid, Port, Signal};
use crate::policy::reload::ReloadFlags;
use crate::policy::store::RoleStore;
use crate::policy::types::{
    AccessMask, Decision, Reason, ResourceClass, Role, RuleOrigin,
};
use log::{debug, warn};
use std::sync::Arc;

#[derive(Clone)]
pub struct DecisionEngine {
    store: RoleStore,
    flags: Arc<ReloadFlags>,
    audit: Arc<AuditChannel>,
    denials: Arc<DenialLedger>,
}

impl DecisionEngine {
    pub fn new(store: RoleStore, flags: Arc<ReloadFlags>, audit: Arc<AuditChannel>) -> Self {
        Self {
            store,
            flags,
            audit,
            denials: Arc::new(DenialLedger::new()),
        }
    }

    pub fn denials(&self) -> &DenialLedger {
        &self.denials
    }

    pub fn audit(&self) -> &AuditChannel {
        &self.audit
    }

    /// Authorize a file access for `requested` operation bits.
    pub fn check_file_access(
        &self,
        file: FileId,
        requested: AccessMask,
        token: &CancelToken,
    ) -> Result<Decision, Interrupted> {
        // Fast path: file enforcement is suspended while roles reload.
        // Decisions taken here carry a distinct reason so the window stays
        // visible to the monitor.
        if self.flags.is_reloading() {
            debug!("file access to {} allowed during role reload", file);
            return Ok(Decision::allow(Reason::ReloadWindow));
        }

        let role = self.active_role(token)?;
        let decision = match role.index().file_access(file, requested) {
            Some((origin, true)) => Decision::allow(rule_reason(&role, origin)),
            Some((origin, false)) => Decision::deny(rule_reason(&role, origin)),
            None => Decision::deny(Reason::Default),
        };

        if !decision.is_allowed() {
            self.report_denial(
                ResourceClass::FileAccess,
                &role,
                AuditEvent::file_denied(file, requested, role.name_arc()),
            );
        }
        Ok(decision)
    }

    /// Authorize binding a socket to `port`.
    pub fn check_port_bind(
        &self,
        port: Port,
        token: &CancelToken,
    ) -> Result<Decision, Interrupted> {
        let role = self.active_role(token)?;
        let decision = match role.index().port_bind(port) {
            Some(origin) => Decision::allow(rule_reason(&role, origin)),
            None => Decision::deny(Reason::Default),
        };

        if !decision.is_allowed() {
            self.report_denial(
                ResourceClass::PortBind,
                &role,
                AuditEvent::port_denied(port, role.name_arc()),
            );
        }
        Ok(decision)
    }

    /// Authorize sending `signal` to the process identified by its pid and
    /// the file identifier of its executable image.
    pub fn check_signal(
        &self,
        target_pid: Pid,
        target_file: FileId,
        signal: Signal,
        token: &CancelToken,
    ) -> Result<Decision, Interrupted> {
        let role = self.active_role(token)?;
        let decision = match role.index().signal_send(target_file, signal) {
            Some((origin, true)) => Decision::allow(rule_reason(&role, origin)),
            Some((origin, false)) => Decision::deny(rule_reason(&role, origin)),
            None => Decision::deny(Reason::Default),
        };

        if !decision.is_allowed() {
            self.report_denial(
                ResourceClass::SignalSend,
                &role,
                AuditEvent::signal_denied(target_pid, target_file, signal, role.name_arc()),
            );
        }
        Ok(decision)
    }

    /// Authorize attaching a tracer to the process identified by its pid
    /// and the file identifier of its executable image.
    pub fn check_trace_attach(
        &self,
        target_pid: Pid,
        target_file: FileId,
        token: &CancelToken,
    ) -> Result<Decision, Interrupted> {
        let role = self.active_role(token)?;
        let decision = match role.index().trace_attach(target_file) {
            Some(origin) => Decision::allow(rule_reason(&role, origin)),
            None => Decision::deny(Reason::Default),
        };

        if !decision.is_allowed() {
            self.report_denial(
                ResourceClass::TraceAttach,
                &role,
                AuditEvent::trace_denied(target_pid, target_file, role.name_arc()),
            );
        }
        Ok(decision)
    }

    /// Snapshot the active role inside the read section.
    fn active_role(&self, token: &CancelToken) -> Result<Arc<Role>, Interrupted> {
        let table = self.store.read_section(token)?;
        Ok(table.active())
    }

    fn report_denial(&self, class: ResourceClass, role: &Role, event: AuditEvent) {
        warn!("{}", event);
        self.denials.record(class, &role.name_arc());
        self.audit.publish(&event.render());
    }
}

fn rule_reason(role: &Role, origin: RuleOrigin) -> Reason {
    Reason::Rule {
        role: role.name_arc(),
        origin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::types::{Rule, Target};

    fn engine_with_roles(roles: Vec<Role>, active: &str) -> DecisionEngine {
        let store = RoleStore::new();
        store.write_section().replace_all(roles, active).unwrap();
        DecisionEngine::new(
            store,
            Arc::new(ReloadFlags::new()),
            Arc::new(AuditChannel::new()),
        )
    }

    fn admin_role() -> Role {
        Role::new(
            "admin",
            vec![Rule::FileAccess {
                target: Target::Exact(42),
                mask: AccessMask::READ | AccessMask::WRITE,
            }],
        )
    }

    #[test]
    fn test_empty_role_denies_by_default() {
        let store = RoleStore::new();
        let engine = DecisionEngine::new(
            store,
            Arc::new(ReloadFlags::new()),
            Arc::new(AuditChannel::new()),
        );
        let token = CancelToken::new();

        let decision = engine
            .check_file_access(42, AccessMask::READ, &token)
            .unwrap();
        assert!(!decision.is_allowed());
        assert_eq!(decision.reason, Reason::Default);
    }

    #[test]
    fn test_exact_rule_allows_and_denies_by_mask() {
        let engine = engine_with_roles(vec![admin_role()], "admin");
        let token = CancelToken::new();

        let read = engine
            .check_file_access(42, AccessMask::READ, &token)
            .unwrap();
        assert!(read.is_allowed());

        let exec = engine
            .check_file_access(42, AccessMask::EXECUTE, &token)
            .unwrap();
        assert!(!exec.is_allowed());
        assert!(matches!(exec.reason, Reason::Rule { origin: RuleOrigin::Exact, .. }));
    }

    #[test]
    fn test_denial_publishes_audit_event() {
        let engine = engine_with_roles(vec![admin_role()], "admin");
        let token = CancelToken::new();

        engine
            .check_file_access(7, AccessMask::READ, &token)
            .unwrap();

        assert!(engine.audit().is_ready());
        let message = engine.audit().consume(1024, &token).unwrap();
        let line = String::from_utf8(message).unwrap();
        assert!(line.contains("file 7"));
        assert!(line.contains("role=admin"));

        assert_eq!(engine.denials().denials_for_role("admin"), 1);
    }

    #[test]
    fn test_allow_publishes_nothing() {
        let engine = engine_with_roles(vec![admin_role()], "admin");
        let token = CancelToken::new();

        engine
            .check_file_access(42, AccessMask::READ, &token)
            .unwrap();
        assert!(!engine.audit().is_ready());
        assert_eq!(engine.denials().stats().total_denials, 0);
    }

    #[test]
    fn test_reload_window_suspends_file_enforcement_only() {
        let flags = Arc::new(ReloadFlags::new());
        let store = RoleStore::new();
        let engine = DecisionEngine::new(
            store.clone(),
            Arc::clone(&flags),
            Arc::new(AuditChannel::new()),
        );
        let token = CancelToken::new();

        let _window = flags.enter();

        // File access short-circuits to Allow without touching the store.
        let file = engine
            .check_file_access(42, AccessMask::all(), &token)
            .unwrap();
        assert!(file.is_allowed());
        assert_eq!(file.reason, Reason::ReloadWindow);

        // Other classes still consult the (default-deny) role.
        let port = engine.check_port_bind(8080, &token).unwrap();
        assert!(!port.is_allowed());
    }

    #[test]
    fn test_cancelled_check_is_interrupted() {
        let engine = engine_with_roles(vec![admin_role()], "admin");
        let token = CancelToken::new();
        token.cancel();

        // Block the read path so the cancellation is what resolves the call.
        let store = engine.store.clone();
        let _writer = store.write_section();
        assert_eq!(
            engine.check_port_bind(80, &token),
            Err(Interrupted)
        );
    }

    #[test]
    fn test_signal_and_trace_checks() {
        let role = Role::new(
            "ops",
            vec![
                Rule::SignalSend {
                    target: Target::Exact(7),
                    signals: [15u32].into_iter().collect(),
                },
                Rule::TraceAttach {
                    target: Target::Exact(7),
                },
            ],
        );
        let engine = engine_with_roles(vec![role], "ops");
        let token = CancelToken::new();

        assert!(engine.check_signal(1000, 7, 15, &token).unwrap().is_allowed());
        assert!(!engine.check_signal(1000, 7, 9, &token).unwrap().is_allowed());
        assert!(!engine.check_signal(1000, 8, 15, &token).unwrap().is_allowed());

        assert!(engine.check_trace_attach(1000, 7, &token).unwrap().is_allowed());
        assert!(!engine.check_trace_attach(1000, 8, &token).unwrap().is_allowed());
    }
}
