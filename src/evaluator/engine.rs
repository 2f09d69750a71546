/*!
 * Evaluator
 * Decides whether a set of approvals satisfies every label on an endpoint
 *
 * Each target label is checked against its rule independently and the
 * per-label results are combined conjunctively. The requester never counts
 * toward any quorum, even when they appear among the approvals.
 *
 * The evaluator is stateless across calls and holds only an immutable table,
 * so one instance can be shared by any number of threads.
 */

use super::config::{EvaluatorConfig, UnknownLabelPolicy};
use super::decision::{Decision, LabelOutcome};
use super::request::AccessRequest;
use super::traits::{ExactMatch, IdentityResolver, LabelSource};
use crate::approvals::ApprovalSet;
use crate::core::errors::{RequestError, RequestResult};
use crate::core::types::{Label, UserId};
use crate::policy::rule::Rule;
use crate::policy::table::{RuleLookup, RuleTable};
use std::sync::Arc;
use tracing::{debug, debug_span, info};

/// Policy evaluator bound to one rule table version
#[derive(Clone)]
pub struct Evaluator {
    table: Arc<RuleTable>,
    config: EvaluatorConfig,
    resolver: Arc<dyn IdentityResolver>,
}

impl Evaluator {
    /// Evaluator with the fail-closed default configuration
    pub fn new(table: Arc<RuleTable>) -> Self {
        Self {
            table,
            config: EvaluatorConfig::default(),
            resolver: Arc::new(ExactMatch),
        }
    }

    pub fn with_config(mut self, config: EvaluatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolver for raw identities passed to `request` and `evaluate_endpoint`
    pub fn with_resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn config(&self) -> EvaluatorConfig {
        self.config
    }

    /// Decide a request; per-label diagnostics are only kept on denial
    pub fn evaluate(&self, request: &AccessRequest) -> Decision {
        self.decide(request, false)
    }

    /// Same decision as `evaluate`, always with full per-label diagnostics
    pub fn explain(&self, request: &AccessRequest) -> Decision {
        self.decide(request, true)
    }

    /// Build a request from raw identities using this evaluator's resolver
    ///
    /// Requests are not re-canonicalized at evaluation time, so callers using
    /// a non-exact resolver should construct requests here.
    pub fn request<'a, L, A>(
        &self,
        requester: &str,
        labels: L,
        approvers: A,
    ) -> RequestResult<AccessRequest>
    where
        L: IntoIterator<Item = &'a str>,
        A: IntoIterator<Item = &'a str>,
    {
        AccessRequest::resolved(self.resolver.as_ref(), requester, labels, approvers)
    }

    /// Resolve an endpoint's labels and decide access to it
    ///
    /// An endpoint the inventory does not know is an invalid request, never
    /// an endpoint without labels.
    pub fn evaluate_endpoint<'a, A>(
        &self,
        source: &dyn LabelSource,
        endpoint_id: &str,
        requester: &str,
        approvers: A,
    ) -> RequestResult<Decision>
    where
        A: IntoIterator<Item = &'a str>,
    {
        let labels = source.labels_for(endpoint_id).ok_or_else(|| {
            RequestError::invalid(format!("unknown endpoint '{}'", endpoint_id))
        })?;
        let request = AccessRequest::from_parts(
            self.resolver.canonicalize(requester),
            labels,
            ApprovalSet::resolved(self.resolver.as_ref(), approvers),
        )?;
        Ok(self.evaluate(&request))
    }

    fn decide(&self, request: &AccessRequest, explain: bool) -> Decision {
        let span = debug_span!(
            "evaluate",
            requester = %request.requester(),
            labels = request.target_labels().len(),
            approvals = request.approvals().len(),
        );
        let _entered = span.enter();

        // BTreeSet iteration keeps outcomes sorted by label
        let per_label: Vec<LabelOutcome> = request
            .target_labels()
            .iter()
            .map(|label| self.evaluate_label(label, request))
            .collect();

        if per_label.iter().all(LabelOutcome::is_granted) {
            debug!("Access granted");
            return Decision::Granted {
                per_label: if explain { per_label } else { Vec::new() },
            };
        }

        let reasons: Vec<_> = per_label.iter().flat_map(|o| o.reasons()).collect();
        info!(
            requester = %request.requester(),
            denied_labels = per_label.iter().filter(|o| !o.is_granted()).count(),
            reasons = reasons.len(),
            "Access denied"
        );
        Decision::Denied { reasons, per_label }
    }

    fn evaluate_label(&self, label: &Label, request: &AccessRequest) -> LabelOutcome {
        let rule = match self.table.lookup(label) {
            RuleLookup::Found(rule) => rule,
            RuleLookup::NoRuleForLabel => {
                let allowed = self.config.unknown_label_policy == UnknownLabelPolicy::Allow;
                debug!(label = %label, allowed, "No rule for label");
                return LabelOutcome::unknown(label.clone(), allowed);
            }
        };

        let have = count_authorized(rule, request.approvals(), request.requester());
        let need = rule.num_approvers_required();
        let missing_requester_authorization =
            rule.requester_must_be_authorized() && !rule.is_member(request.requester());

        let outcome = LabelOutcome::checked(label.clone(), have, need, missing_requester_authorization);
        debug!(
            label = %label,
            have,
            need,
            missing_requester_authorization,
            granted = outcome.is_granted(),
            "Label evaluated"
        );
        outcome
    }
}

/// Approvers that belong to the rule's group, requester excluded
///
/// Walks whichever side is smaller and probes the other.
fn count_authorized(rule: &Rule, approvals: &ApprovalSet, requester: &UserId) -> u32 {
    let count = if approvals.len() <= rule.users().len() {
        approvals
            .iter()
            .filter(|user| *user != requester && rule.is_member(user))
            .count()
    } else {
        rule.users()
            .iter()
            .filter(|user| *user != requester && approvals.contains(user))
            .count()
    };
    u32::try_from(count).unwrap_or(u32::MAX)
}
