/*!
 * Policy Engine Limits and Constants
 *
 * Centralized location for size bounds on policy documents and requests.
 * Security-critical constants are marked with [SECURITY].
 */

// =============================================================================
// POLICY DOCUMENT LIMITS
// =============================================================================

/// Maximum policy document size (1MB)
/// [SECURITY] Bounds parser memory for operator-supplied documents
pub const MAX_POLICY_DOCUMENT_BYTES: usize = 1024 * 1024;

/// Maximum number of rules in one policy version
pub const MAX_RULES: usize = 10_000;

/// Maximum approvers in a single rule's group
pub const MAX_GROUP_SIZE: usize = 4_096;

// =============================================================================
// REQUEST LIMITS
// =============================================================================

/// Maximum labels on a single access request
/// [SECURITY] Keeps evaluation bounded at O(labels x group size)
pub const MAX_REQUEST_LABELS: usize = 1_024;

/// Maximum approvals offered for a single access request
pub const MAX_REQUEST_APPROVALS: usize = 4_096;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Selects `deny` or `allow` for labels that have no rule
pub const ENV_UNKNOWN_LABEL_POLICY: &str = "APPROVAL_UNKNOWN_LABEL_POLICY";

/// Enables strict loading (unknown fields are errors)
pub const ENV_POLICY_STRICT: &str = "APPROVAL_POLICY_STRICT";

/// Enables JSON log output
pub const ENV_TRACE_JSON: &str = "APPROVAL_TRACE_JSON";
