/*!
 * Approval Policy Library
 * Label-based multi-party approval engine for gating endpoint access
 *
 * An endpoint carries labels; each label may have a rule naming an approver
 * group and a quorum. A request is granted only when every label's rule is
 * satisfied by approvals from group members other than the requester.
 */

pub mod approvals;
pub mod core;
pub mod evaluator;
pub mod monitoring;
pub mod policy;
pub mod report;

// Re-exports
pub use approvals::{Approval, ApprovalSet};
pub use crate::core::{
    Label, LoadError, LoadResult, PolicyViolation, RequestError, RequestId, RequestResult, UserId,
};
pub use evaluator::{
    AccessRequest, Decision, DenialReason, Evaluator, EvaluatorConfig, IdentityResolver,
    LabelOutcome, LabelSource, UnknownLabelPolicy,
};
pub use monitoring::init_tracing;
pub use policy::{load_policy, LoadOptions, PolicyLoader, PolicyStore, Rule, RuleRecord, RuleTable};
pub use report::{DecisionReport, ExitStatus, FailureReport};
