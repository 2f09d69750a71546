/*!
 * Evaluator Module
 * Access requests, decisions, and the label-based approval evaluator
 *
 * ## Usage
 * ```ignore
 * use approval_policy::evaluator::{AccessRequest, Evaluator};
 * use approval_policy::policy::load_policy;
 * use std::sync::Arc;
 *
 * let table = load_policy(document)?;
 * let evaluator = Evaluator::new(Arc::new(table));
 *
 * let request = AccessRequest::new("alice", ["legal_approval"], ["legal1"])?;
 * if evaluator.evaluate(&request).is_granted() {
 *     // Open the endpoint
 * }
 * ```
 */

pub mod config;
pub mod decision;
pub mod engine;
pub mod request;
pub mod traits;

pub use config::{EvaluatorConfig, UnknownLabelPolicy};
pub use decision::{Decision, DenialReason, LabelOutcome, LabelStatus};
pub use engine::Evaluator;
pub use request::{AccessRequest, RequestDocument};
pub use traits::{CaseInsensitive, ExactMatch, IdentityResolver, LabelSource, StaticLabelSource};
