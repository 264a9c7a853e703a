/*!
 * Policy Types
 * Roles, rules, operation masks, and decision outcomes
 */

use crate::core::limits::MAX_SIGNAL;
use crate::core::types::{FileId, Port, Signal};
use crate::policy::index::PermissionIndex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

/// Name of the built-in zero-rule role seeded at startup.
pub const EMPTY_ROLE: &str = "empty";

/// Resource class a rule or decision applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    FileAccess,
    PortBind,
    SignalSend,
    TraceAttach,
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceClass::FileAccess => "file_access",
            ResourceClass::PortBind => "port_bind",
            ResourceClass::SignalSend => "signal_send",
            ResourceClass::TraceAttach => "trace_attach",
        };
        f.write_str(name)
    }
}

/// File operation mask with read/write/execute bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessMask(u32);

impl AccessMask {
    pub const READ: AccessMask = AccessMask(0b100);
    pub const WRITE: AccessMask = AccessMask(0b010);
    pub const EXECUTE: AccessMask = AccessMask(0b001);

    pub const fn empty() -> Self {
        AccessMask(0)
    }

    pub const fn all() -> Self {
        AccessMask(0b111)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `requested` is permitted by this mask.
    pub const fn permits(self, requested: AccessMask) -> bool {
        self.0 & requested.0 == requested.0
    }
}

impl BitOr for AccessMask {
    type Output = AccessMask;

    fn bitor(self, rhs: AccessMask) -> AccessMask {
        AccessMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for AccessMask {
    fn bitor_assign(&mut self, rhs: AccessMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for AccessMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(3);
        out.push(if self.permits(Self::READ) { 'r' } else { '-' });
        out.push(if self.permits(Self::WRITE) { 'w' } else { '-' });
        out.push(if self.permits(Self::EXECUTE) { 'x' } else { '-' });
        f.write_str(&out)
    }
}

/// Fixed-width set of permitted signal numbers (1..=MAX_SIGNAL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalSet(u64);

impl SignalSet {
    pub const fn empty() -> Self {
        SignalSet(0)
    }

    pub const fn all() -> Self {
        SignalSet(u64::MAX)
    }

    /// Add a signal to the set. Returns false for out-of-range numbers.
    pub fn insert(&mut self, signal: Signal) -> bool {
        if !Self::in_range(signal) {
            return false;
        }
        self.0 |= 1u64 << (signal - 1);
        true
    }

    pub fn contains(self, signal: Signal) -> bool {
        Self::in_range(signal) && self.0 & (1u64 << (signal - 1)) != 0
    }

    pub const fn in_range(signal: Signal) -> bool {
        signal >= 1 && signal <= MAX_SIGNAL
    }
}

impl FromIterator<Signal> for SignalSet {
    fn from_iter<I: IntoIterator<Item = Signal>>(iter: I) -> Self {
        let mut set = SignalSet::empty();
        for signal in iter {
            set.insert(signal);
        }
        set
    }
}

/// Target matcher for a rule: a specific resource identifier or any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target<T> {
    Exact(T),
    Any,
}

/// A single policy rule: resource class, target matcher, permitted operations.
///
/// PortBind and TraceAttach rules carry no operation mask: matching the
/// target is the grant. Anything not matched by any rule resolves to Deny.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "class")]
pub enum Rule {
    FileAccess { target: Target<FileId>, mask: AccessMask },
    PortBind { target: Target<Port> },
    SignalSend { target: Target<FileId>, signals: SignalSet },
    TraceAttach { target: Target<FileId> },
}

impl Rule {
    pub fn class(&self) -> ResourceClass {
        match self {
            Rule::FileAccess { .. } => ResourceClass::FileAccess,
            Rule::PortBind { .. } => ResourceClass::PortBind,
            Rule::SignalSend { .. } => ResourceClass::SignalSend,
            Rule::TraceAttach { .. } => ResourceClass::TraceAttach,
        }
    }
}

/// A named, immutable collection of rules with its compiled lookup index.
///
/// Roles are constructed once per load generation and never mutated;
/// a reload builds a fresh role set rather than editing roles in place.
#[derive(Debug)]
pub struct Role {
    name: Arc<str>,
    rules: Vec<Rule>,
    index: PermissionIndex,
}

impl Role {
    pub fn new(name: impl Into<Arc<str>>, rules: Vec<Rule>) -> Self {
        let name = name.into();
        let index = PermissionIndex::build(&name, &rules);
        Self { name, rules, index }
    }

    /// The built-in default-deny role: zero rules, every lookup misses.
    pub fn empty() -> Self {
        Self::new(EMPTY_ROLE, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn index(&self) -> &PermissionIndex {
        &self.index
    }
}

/// Which kind of rule matched a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOrigin {
    Exact,
    Wildcard,
}

/// Why a decision came out the way it did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum Reason {
    /// A rule in the named role produced the outcome.
    Rule { role: Arc<str>, origin: RuleOrigin },
    /// No rule matched; the default-deny closure applied.
    Default,
    /// File enforcement was suspended for the duration of a role reload.
    ReloadWindow,
}

/// Decision verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allow,
    Deny,
}

/// Outcome of a mediation check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Decision {
    pub verdict: Verdict,
    pub reason: Reason,
}

impl Decision {
    pub fn allow(reason: Reason) -> Self {
        Self {
            verdict: Verdict::Allow,
            reason,
        }
    }

    pub fn deny(reason: Reason) -> Self {
        Self {
            verdict: Verdict::Deny,
            reason,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.verdict == Verdict::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_permits() {
        let rw = AccessMask::READ | AccessMask::WRITE;
        assert!(rw.permits(AccessMask::READ));
        assert!(rw.permits(AccessMask::WRITE));
        assert!(rw.permits(rw));
        assert!(!rw.permits(AccessMask::EXECUTE));
        assert!(!AccessMask::empty().permits(AccessMask::READ));
        // The empty request is vacuously permitted
        assert!(AccessMask::empty().permits(AccessMask::empty()));
    }

    #[test]
    fn test_mask_display() {
        assert_eq!((AccessMask::READ | AccessMask::WRITE).to_string(), "rw-");
        assert_eq!(AccessMask::all().to_string(), "rwx");
        assert_eq!(AccessMask::empty().to_string(), "---");
    }

    #[test]
    fn test_signal_set_bounds() {
        let mut set = SignalSet::empty();
        assert!(set.insert(1));
        assert!(set.insert(64));
        assert!(!set.insert(0));
        assert!(!set.insert(65));

        assert!(set.contains(1));
        assert!(set.contains(64));
        assert!(!set.contains(9));
        assert!(!set.contains(0));
        assert!(!set.contains(65));
    }

    #[test]
    fn test_signal_set_from_iter() {
        let set: SignalSet = [9u32, 15].into_iter().collect();
        assert!(set.contains(9));
        assert!(set.contains(15));
        assert!(!set.contains(2));
    }

    #[test]
    fn test_empty_role_has_no_rules() {
        let role = Role::empty();
        assert_eq!(role.name(), EMPTY_ROLE);
        assert!(role.rules().is_empty());
    }

    #[test]
    fn test_rule_class() {
        let rule = Rule::PortBind {
            target: Target::Exact(8080u16),
        };
        assert_eq!(rule.class(), ResourceClass::PortBind);
    }
}
