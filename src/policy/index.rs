/*!
 * Permission Index
 * Per-role rule tables compiled once at role construction
 *
 * The index replaces a linear scan of the rule list on every check with
 * hashed lookups, since checks sit on the hot path of essentially every
 * file open, signal, trace attach, and port bind. Built once per role and
 * never mutated afterwards (construct-then-freeze).
 *
 * Matching policy: exact-target rules take precedence over wildcard rules.
 * If a role carries multiple exact rules for the same target (malformed
 * policy), the first rule encountered during construction wins; duplicates
 * are flagged with a warning at build time rather than silently resolved.
 * No match resolves to Deny.
 */

use crate::core::types::{FileId, Port, Signal};
use crate::policy::types::{AccessMask, Rule, RuleOrigin, SignalSet, Target};
use ahash::RandomState;
use log::warn;
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
pub struct PermissionIndex {
    file_exact: HashMap<FileId, AccessMask, RandomState>,
    file_any: Option<AccessMask>,
    port_exact: HashSet<Port, RandomState>,
    port_any: bool,
    signal_exact: HashMap<FileId, SignalSet, RandomState>,
    signal_any: Option<SignalSet>,
    trace_exact: HashSet<FileId, RandomState>,
    trace_any: bool,
}

impl PermissionIndex {
    /// Compile the rule list for one role. `role` is only used to attribute
    /// duplicate-rule warnings.
    pub(crate) fn build(role: &str, rules: &[Rule]) -> Self {
        let mut index = Self {
            file_exact: HashMap::with_hasher(RandomState::new()),
            file_any: None,
            port_exact: HashSet::with_hasher(RandomState::new()),
            port_any: false,
            signal_exact: HashMap::with_hasher(RandomState::new()),
            signal_any: None,
            trace_exact: HashSet::with_hasher(RandomState::new()),
            trace_any: false,
        };

        for rule in rules {
            match rule {
                Rule::FileAccess { target, mask } => match target {
                    Target::Exact(file) => {
                        if index.file_exact.contains_key(file) {
                            warn!("role '{}': duplicate file rule for {}, first wins", role, file);
                        } else {
                            index.file_exact.insert(*file, *mask);
                        }
                    }
                    Target::Any => {
                        if index.file_any.is_some() {
                            warn!("role '{}': duplicate file wildcard rule, first wins", role);
                        } else {
                            index.file_any = Some(*mask);
                        }
                    }
                },
                Rule::PortBind { target } => match target {
                    Target::Exact(port) => {
                        index.port_exact.insert(*port);
                    }
                    Target::Any => index.port_any = true,
                },
                Rule::SignalSend { target, signals } => match target {
                    Target::Exact(file) => {
                        if index.signal_exact.contains_key(file) {
                            warn!(
                                "role '{}': duplicate signal rule for {}, first wins",
                                role, file
                            );
                        } else {
                            index.signal_exact.insert(*file, *signals);
                        }
                    }
                    Target::Any => {
                        if index.signal_any.is_some() {
                            warn!("role '{}': duplicate signal wildcard rule, first wins", role);
                        } else {
                            index.signal_any = Some(*signals);
                        }
                    }
                },
                Rule::TraceAttach { target } => match target {
                    Target::Exact(file) => {
                        index.trace_exact.insert(*file);
                    }
                    Target::Any => index.trace_any = true,
                },
            }
        }

        index
    }

    /// Look up a file access. `Some((origin, permitted))` when a rule
    /// matched the target; `None` when the default-deny closure applies.
    pub fn file_access(&self, file: FileId, requested: AccessMask) -> Option<(RuleOrigin, bool)> {
        if let Some(mask) = self.file_exact.get(&file) {
            return Some((RuleOrigin::Exact, mask.permits(requested)));
        }
        self.file_any
            .map(|mask| (RuleOrigin::Wildcard, mask.permits(requested)))
    }

    /// Look up a port bind. A matching rule is the grant.
    pub fn port_bind(&self, port: Port) -> Option<RuleOrigin> {
        if self.port_exact.contains(&port) {
            return Some(RuleOrigin::Exact);
        }
        self.port_any.then_some(RuleOrigin::Wildcard)
    }

    /// Look up a signal send against the target's file identifier.
    pub fn signal_send(&self, file: FileId, signal: Signal) -> Option<(RuleOrigin, bool)> {
        if let Some(set) = self.signal_exact.get(&file) {
            return Some((RuleOrigin::Exact, set.contains(signal)));
        }
        self.signal_any
            .map(|set| (RuleOrigin::Wildcard, set.contains(signal)))
    }

    /// Look up a trace attachment against the target's file identifier.
    pub fn trace_attach(&self, file: FileId) -> Option<RuleOrigin> {
        if self.trace_exact.contains(&file) {
            return Some(RuleOrigin::Exact);
        }
        self.trace_any.then_some(RuleOrigin::Wildcard)
    }

    pub fn is_empty(&self) -> bool {
        self.file_exact.is_empty()
            && self.file_any.is_none()
            && self.port_exact.is_empty()
            && !self.port_any
            && self.signal_exact.is_empty()
            && self.signal_any.is_none()
            && self.trace_exact.is_empty()
            && !self.trace_any
    }
}
