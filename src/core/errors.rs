/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 *
 * Two families live here:
 * - Load errors: a policy version is rejected as a whole, every violation is reported
 * - Request errors: a single evaluation call is malformed
 *
 * Denied decisions are not errors; see `evaluator::decision`.
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single problem found while loading or validating a policy document
///
/// `document` is the zero-based index of the `---`-separated record the
/// problem was found in, when it can be attributed to one.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyViolation {
    #[error("parse error in document {document}: {message}")]
    #[diagnostic(
        code(policy::parse_error),
        help("Each record must be a mapping with `label` and `users` fields.")
    )]
    ParseError { document: usize, message: String },

    #[error("label '{label}' is defined in document {first} and again in document {document}")]
    #[diagnostic(
        code(policy::duplicate_label),
        help("Merge the two records; a label may carry exactly one rule.")
    )]
    DuplicateLabel {
        label: String,
        first: usize,
        document: usize,
    },

    #[error("rule '{label}' has an empty approver group")]
    #[diagnostic(
        code(policy::empty_group),
        help("List at least one user under `users`.")
    )]
    EmptyGroup { label: String },

    #[error("rule '{label}' lists user '{user}' more than once")]
    #[diagnostic(code(policy::duplicate_user))]
    DuplicateUser { label: String, user: String },

    #[error("rule '{label}' contains an empty user identity")]
    #[diagnostic(code(policy::empty_identity))]
    EmptyIdentity { label: String },

    #[error("rule '{label}' requires {required} approvers but only {available} are eligible")]
    #[diagnostic(
        code(policy::invalid_quorum),
        help(
            "`num_approvers_required` must be at least 1 and no larger than the group. \
             With `requester_must_be_authorized` the requester's seat does not count."
        )
    )]
    InvalidQuorum {
        label: String,
        required: i64,
        available: usize,
    },

    #[error("unknown field '{field}' in document {document}")]
    #[diagnostic(
        code(policy::unknown_field),
        help("Recognized fields: label, users, num_approvers_required, requester_must_be_authorized.")
    )]
    UnknownField { document: usize, field: String },

    #[error("policy document is {size} bytes, limit is {limit}")]
    #[diagnostic(code(policy::too_large))]
    TooLarge { size: usize, limit: usize },

    #[error("cannot read policy '{path}': {message}")]
    #[diagnostic(code(policy::unreadable))]
    Unreadable { path: String, message: String },
}

impl PolicyViolation {
    /// Stable short name of the violation kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ParseError { .. } => "parse_error",
            Self::DuplicateLabel { .. } => "duplicate_label",
            Self::EmptyGroup { .. } => "empty_group",
            Self::DuplicateUser { .. } => "duplicate_user",
            Self::EmptyIdentity { .. } => "empty_identity",
            Self::InvalidQuorum { .. } => "invalid_quorum",
            Self::UnknownField { .. } => "unknown_field",
            Self::TooLarge { .. } => "too_large",
            Self::Unreadable { .. } => "unreadable",
        }
    }
}

/// Policy load failure carrying every violation found
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[error("policy rejected with {} violation(s)", .violations.len())]
#[diagnostic(
    code(policy::load_failed),
    help("No rules from this document were activated. Fix every listed violation and reload.")
)]
pub struct LoadError {
    #[related]
    pub violations: Vec<PolicyViolation>,
}

impl LoadError {
    pub fn new(violations: Vec<PolicyViolation>) -> Self {
        Self { violations }
    }

    pub fn single(violation: PolicyViolation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    /// Check whether any violation has the given kind
    pub fn contains_kind(&self, kind: &str) -> bool {
        self.violations.iter().any(|v| v.kind() == kind)
    }
}

impl From<PolicyViolation> for LoadError {
    fn from(violation: PolicyViolation) -> Self {
        Self::single(violation)
    }
}

/// Errors fatal to a single evaluation call
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum RequestError {
    #[error("Invalid request: {reason}")]
    #[diagnostic(
        code(request::invalid),
        help("Requests need a non-empty requester, non-empty labels and non-empty approver identities.")
    )]
    InvalidRequest { reason: String },
}

impl RequestError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
pub type RequestResult<T> = Result<T, RequestError>;
