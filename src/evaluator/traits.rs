/*!
 * Collaborator Traits
 * Narrow interfaces to the fleet inventory and identity systems
 */

use crate::core::types::{Label, UserId};
use ahash::HashMap;
use std::collections::BTreeSet;

/// Resolves which labels are attached to an endpoint
pub trait LabelSource: Send + Sync {
    /// Labels for an endpoint, or `None` if the endpoint is unknown
    fn labels_for(&self, endpoint_id: &str) -> Option<BTreeSet<Label>>;
}

/// Maps raw user strings into the identity space rules are written in
pub trait IdentityResolver: Send + Sync {
    fn canonicalize(&self, user: &str) -> UserId;
}

/// Identity used as-is; plain string equality
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl IdentityResolver for ExactMatch {
    #[inline]
    fn canonicalize(&self, user: &str) -> UserId {
        UserId::new(user)
    }
}

/// Surrounding whitespace trimmed, ASCII case folded
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitive;

impl IdentityResolver for CaseInsensitive {
    fn canonicalize(&self, user: &str) -> UserId {
        UserId::new(user.trim().to_ascii_lowercase())
    }
}

/// In-memory endpoint inventory
#[derive(Debug, Clone, Default)]
pub struct StaticLabelSource {
    endpoints: HashMap<String, BTreeSet<Label>>,
}

impl StaticLabelSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint<I, L>(mut self, endpoint_id: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        self.insert(endpoint_id, labels);
        self
    }

    pub fn insert<I, L>(&mut self, endpoint_id: impl Into<String>, labels: I)
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        self.endpoints
            .insert(endpoint_id.into(), labels.into_iter().map(Into::into).collect());
    }
}

impl LabelSource for StaticLabelSource {
    fn labels_for(&self, endpoint_id: &str) -> Option<BTreeSet<Label>> {
        self.endpoints.get(endpoint_id).cloned()
    }
}
