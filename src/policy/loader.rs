/*!
 * Role Loader
 * Loader collaborator interface and the shipped JSON policy loader
 *
 * The core depends only on the `RoleLoader` signature; the textual policy
 * syntax is owned here. The JSON document shape:
 *
 * ```json
 * {
 *   "active_role": "admin",
 *   "roles": [
 *     {
 *       "name": "admin",
 *       "rules": [
 *         { "class": "file_access", "target": { "exact": 42 }, "mask": ["read", "write"] },
 *         { "class": "port_bind", "target": "any" },
 *         { "class": "signal_send", "target": { "exact": 7 }, "signals": [9, 15] },
 *         { "class": "trace_attach", "target": { "exact": 7 } }
 *       ]
 *     }
 *   ]
 * }
 * ```
 */

use crate::core::errors::LoadError;
use crate::core::types::{FileId, Port, Signal};
use crate::policy::types::{AccessMask, Role, Rule, SignalSet, Target};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fallback policy source when no explicit path is configured.
const DEFAULT_POLICY_PATH: &str = "/etc/rolegate/policy.json";

/// Environment variable overriding the policy source location.
const POLICY_PATH_ENV: &str = "ROLEGATE_POLICY_PATH";

/// Output of one load cycle: the parsed roles and the name to activate.
#[derive(Debug)]
pub struct RoleBundle {
    pub roles: Vec<Role>,
    pub active_role: String,
}

/// Loader collaborator invoked by the reload coordinator while it holds the
/// store's exclusive section. Implementations must not call back into the
/// decision engine's locked paths.
pub trait RoleLoader: Send + Sync {
    fn load_roles(&self) -> Result<RoleBundle, LoadError>;
}

/// Policy source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub source: PathBuf,
}

impl PolicyConfig {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Resolve the source from `ROLEGATE_POLICY_PATH`, falling back to the
    /// conventional system location.
    pub fn from_env() -> Self {
        let source = std::env::var(POLICY_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_POLICY_PATH));
        Self { source }
    }
}

/// Loads roles from a JSON policy document on disk.
pub struct JsonPolicyLoader {
    config: PolicyConfig,
}

impl JsonPolicyLoader {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(PolicyConfig::new(path))
    }

    pub fn source(&self) -> &Path {
        &self.config.source
    }
}

impl RoleLoader for JsonPolicyLoader {
    fn load_roles(&self) -> Result<RoleBundle, LoadError> {
        debug!("loading policy from {}", self.config.source.display());

        let text = std::fs::read_to_string(&self.config.source).map_err(|err| {
            LoadError::Unreadable {
                path: self.config.source.display().to_string(),
                reason: err.to_string(),
            }
        })?;

        let document: PolicyDocument =
            serde_json::from_str(&text).map_err(|err| LoadError::Parse(err.to_string()))?;

        document.into_bundle()
    }
}

// Document shapes. Kept separate from the domain types so the wire format
// can evolve without touching the decision path.

#[derive(Debug, Serialize, Deserialize)]
struct PolicyDocument {
    active_role: String,
    roles: Vec<RoleSpec>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RoleSpec {
    name: String,
    #[serde(default)]
    rules: Vec<RuleSpec>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "class")]
enum RuleSpec {
    FileAccess {
        target: TargetSpec<FileId>,
        mask: Vec<FileOp>,
    },
    PortBind {
        target: TargetSpec<Port>,
    },
    SignalSend {
        target: TargetSpec<FileId>,
        signals: Vec<Signal>,
    },
    TraceAttach {
        target: TargetSpec<FileId>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TargetSpec<T> {
    Exact(T),
    Any,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FileOp {
    Read,
    Write,
    Execute,
}

impl From<FileOp> for AccessMask {
    fn from(op: FileOp) -> AccessMask {
        match op {
            FileOp::Read => AccessMask::READ,
            FileOp::Write => AccessMask::WRITE,
            FileOp::Execute => AccessMask::EXECUTE,
        }
    }
}

impl<T> From<TargetSpec<T>> for Target<T> {
    fn from(spec: TargetSpec<T>) -> Target<T> {
        match spec {
            TargetSpec::Exact(target) => Target::Exact(target),
            TargetSpec::Any => Target::Any,
        }
    }
}

impl PolicyDocument {
    fn into_bundle(self) -> Result<RoleBundle, LoadError> {
        let mut roles = Vec::with_capacity(self.roles.len());
        for spec in self.roles {
            roles.push(spec.into_role()?);
        }
        Ok(RoleBundle {
            roles,
            active_role: self.active_role,
        })
    }
}

impl RoleSpec {
    fn into_role(self) -> Result<Role, LoadError> {
        let mut rules = Vec::with_capacity(self.rules.len());
        for rule in self.rules {
            rules.push(convert_rule(&self.name, rule)?);
        }
        Ok(Role::new(self.name, rules))
    }
}

fn convert_rule(role: &str, spec: RuleSpec) -> Result<Rule, LoadError> {
    let rule = match spec {
        RuleSpec::FileAccess { target, mask } => {
            let mut bits = AccessMask::empty();
            for op in mask {
                bits |= AccessMask::from(op);
            }
            if bits.is_empty() {
                return Err(LoadError::InvalidRule {
                    role: role.to_string(),
                    reason: "file rule grants no operations".to_string(),
                });
            }
            Rule::FileAccess {
                target: target.into(),
                mask: bits,
            }
        }
        RuleSpec::PortBind { target } => Rule::PortBind {
            target: target.into(),
        },
        RuleSpec::SignalSend { target, signals } => {
            let mut set = SignalSet::empty();
            for signal in signals {
                if !set.insert(signal) {
                    return Err(LoadError::InvalidRule {
                        role: role.to_string(),
                        reason: format!("signal {} out of range", signal),
                    });
                }
            }
            Rule::SignalSend {
                target: target.into(),
                signals: set,
            }
        }
        RuleSpec::TraceAttach { target } => Rule::TraceAttach {
            target: target.into(),
        },
    };
    Ok(rule)
}
