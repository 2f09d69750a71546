/*!
 * Approval Set
 * Deduplicated approver identities offered for one access request
 */

use crate::core::types::{RequestId, UserId};
use crate::evaluator::traits::IdentityResolver;
use ahash::HashSet;
use serde::{Deserialize, Serialize};

/// A single approval record as stored by the caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Approval {
    pub approver: UserId,
    pub request_id: RequestId,
}

impl Approval {
    pub fn new(approver: impl Into<UserId>, request_id: impl Into<RequestId>) -> Self {
        Self {
            approver: approver.into(),
            request_id: request_id.into(),
        }
    }
}

/// Set of approver identities with O(1) membership
///
/// Insertion order is not preserved; duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalSet {
    approvers: HashSet<UserId>,
}

impl ApprovalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from identities taken as-is
    pub fn from_approvers<I, U>(approvers: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UserId>,
    {
        approvers.into_iter().map(Into::into).collect()
    }

    /// Build from raw strings, canonicalizing each
    pub fn resolved<'a, I>(resolver: &dyn IdentityResolver, approvers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        approvers
            .into_iter()
            .map(|raw| resolver.canonicalize(raw))
            .collect()
    }

    /// Keep only approvals granted for `request_id`
    pub fn for_request<'a, I>(request_id: &RequestId, approvals: I) -> Self
    where
        I: IntoIterator<Item = &'a Approval>,
    {
        approvals
            .into_iter()
            .filter(|approval| &approval.request_id == request_id)
            .map(|approval| approval.approver.clone())
            .collect()
    }

    /// Returns false if the approver was already present
    pub fn insert(&mut self, approver: impl Into<UserId>) -> bool {
        self.approvers.insert(approver.into())
    }

    #[inline]
    pub fn contains(&self, approver: &UserId) -> bool {
        self.approvers.contains(approver)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.approvers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.approvers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.approvers.iter()
    }
}

impl FromIterator<UserId> for ApprovalSet {
    fn from_iter<T: IntoIterator<Item = UserId>>(iter: T) -> Self {
        Self {
            approvers: iter.into_iter().collect(),
        }
    }
}
