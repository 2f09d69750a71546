/*!
 * Access Request
 * A requester, the labels on the target endpoint, and the offered approvals
 *
 * Requests are validated on construction; an `AccessRequest` value always has
 * a non-empty requester, non-empty labels, and non-empty approver identities.
 */

use crate::approvals::ApprovalSet;
use crate::core::errors::{RequestError, RequestResult};
use crate::core::limits::{MAX_REQUEST_APPROVALS, MAX_REQUEST_LABELS};
use crate::core::types::{Label, UserId};
use crate::evaluator::traits::{ExactMatch, IdentityResolver};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Validated access request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    requester: UserId,
    target_labels: BTreeSet<Label>,
    approvals: ApprovalSet,
}

impl AccessRequest {
    /// Build a request with identities taken as-is
    ///
    /// Identities are compared verbatim against rule members. When the table
    /// was loaded with a canonicalizing resolver, build the request with
    /// `Evaluator::request` (or `resolved`) so both sides share one identity
    /// space; a verbatim request against such a table is denied.
    pub fn new<'a, L, A>(requester: &str, labels: L, approvers: A) -> RequestResult<Self>
    where
        L: IntoIterator<Item = &'a str>,
        A: IntoIterator<Item = &'a str>,
    {
        Self::resolved(&ExactMatch, requester, labels, approvers)
    }

    /// Build a request, canonicalizing the requester and approvers
    pub fn resolved<'a, L, A>(
        resolver: &dyn IdentityResolver,
        requester: &str,
        labels: L,
        approvers: A,
    ) -> RequestResult<Self>
    where
        L: IntoIterator<Item = &'a str>,
        A: IntoIterator<Item = &'a str>,
    {
        let requester = resolver.canonicalize(requester);
        let target_labels = labels.into_iter().map(Label::new).collect();
        let approvals = ApprovalSet::resolved(resolver, approvers);
        Self::from_parts(requester, target_labels, approvals)
    }

    /// Assemble a request from already-canonical parts
    pub fn from_parts(
        requester: UserId,
        target_labels: BTreeSet<Label>,
        approvals: ApprovalSet,
    ) -> RequestResult<Self> {
        if requester.is_empty() {
            return Err(RequestError::invalid("requester is missing"));
        }
        if target_labels.iter().any(Label::is_empty) {
            return Err(RequestError::invalid("target labels must be non-empty strings"));
        }
        if target_labels.len() > MAX_REQUEST_LABELS {
            return Err(RequestError::invalid(format!(
                "{} target labels exceeds limit of {}",
                target_labels.len(),
                MAX_REQUEST_LABELS
            )));
        }
        if approvals.iter().any(UserId::is_empty) {
            return Err(RequestError::invalid("approver identities must be non-empty"));
        }
        if approvals.len() > MAX_REQUEST_APPROVALS {
            return Err(RequestError::invalid(format!(
                "{} approvals exceeds limit of {}",
                approvals.len(),
                MAX_REQUEST_APPROVALS
            )));
        }

        Ok(Self {
            requester,
            target_labels,
            approvals,
        })
    }

    #[inline]
    pub fn requester(&self) -> &UserId {
        &self.requester
    }

    /// Effective label set, sorted
    #[inline]
    pub fn target_labels(&self) -> &BTreeSet<Label> {
        &self.target_labels
    }

    #[inline]
    pub fn approvals(&self) -> &ApprovalSet {
        &self.approvals
    }

    /// Copy of this request with one more approver
    pub fn with_approver(&self, approver: impl Into<UserId>) -> RequestResult<Self> {
        let mut approvals = self.approvals.clone();
        approvals.insert(approver);
        Self::from_parts(self.requester.clone(), self.target_labels.clone(), approvals)
    }

    /// Copy of this request without `label`
    pub fn without_label(&self, label: &Label) -> Self {
        let mut target_labels = self.target_labels.clone();
        target_labels.remove(label);
        Self {
            requester: self.requester.clone(),
            target_labels,
            approvals: self.approvals.clone(),
        }
    }
}

/// Wire form of a request, as submitted in JSON
///
/// Every field is optional at the serde level so that a missing requester
/// surfaces as `InvalidRequest` rather than a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDocument {
    #[serde(default)]
    pub requester: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub approvals: Vec<String>,
}

impl RequestDocument {
    pub fn into_request(self, resolver: &dyn IdentityResolver) -> RequestResult<AccessRequest> {
        let requester = self
            .requester
            .ok_or_else(|| RequestError::invalid("requester is missing"))?;
        AccessRequest::resolved(
            resolver,
            &requester,
            self.labels.iter().map(String::as_str),
            self.approvals.iter().map(String::as_str),
        )
    }
}
