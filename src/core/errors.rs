/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the reload path.
///
/// A `LoadError` is local to reloads: it is reported to the privileged
/// caller that triggered the reload and never propagates into decision
/// calls. After a failed load the store sits at its default-deny reset
/// state until the next successful reload.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum LoadError {
    #[error("policy source unreadable: {path}: {reason}")]
    #[diagnostic(
        code(load::unreadable),
        help("Check that the policy source exists and is readable by this process.")
    )]
    Unreadable { path: String, reason: String },

    #[error("policy source malformed: {0}")]
    #[diagnostic(
        code(load::parse_failed),
        help("The policy document could not be parsed. Validate it against the documented schema.")
    )]
    Parse(String),

    #[error("policy defines no roles")]
    #[diagnostic(
        code(load::empty_role_set),
        help("A role set must contain at least one role. The previous/default state is preserved.")
    )]
    EmptyRoleSet,

    #[error("duplicate role name: {0}")]
    #[diagnostic(
        code(load::duplicate_role),
        help("Role names must be unique within one load generation.")
    )]
    DuplicateRole(String),

    #[error("invalid rule in role '{role}': {reason}")]
    #[diagnostic(
        code(load::invalid_rule),
        help("Fix the offending rule; no partial role set is installed.")
    )]
    InvalidRule { role: String, reason: String },
}

/// A blocking wait was cancelled by the caller.
///
/// Distinct from any decision outcome: an interrupted check is neither
/// Allow nor Deny, and an interrupted consume delivers no message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[error("wait interrupted by caller")]
#[diagnostic(
    code(sync::interrupted),
    help("The cancellation token was triggered while waiting. Retry if the wait is still wanted.")
)]
pub struct Interrupted;
