/*!
 * Rule Types
 * Raw policy records and the validated rules built from them
 */

use crate::core::types::{Label, UserId};
use ahash::HashSet;
use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Quorum applied when a record omits `num_approvers_required`
pub const DEFAULT_NUM_APPROVERS: i64 = 1;

/// One policy record as written by an operator, before validation
///
/// Quorum is kept signed so that negative values surface as
/// `InvalidQuorum` rather than a parse failure. Integers outside `i64`
/// saturate for the same reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub label: String,
    pub users: Vec<String>,
    #[serde(
        default = "default_num_approvers",
        deserialize_with = "deserialize_quorum"
    )]
    pub num_approvers_required: i64,
    #[serde(default)]
    pub requester_must_be_authorized: bool,
}

fn default_num_approvers() -> i64 {
    DEFAULT_NUM_APPROVERS
}

fn deserialize_quorum<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(QuorumVisitor)
}

struct QuorumVisitor;

impl<'de> Visitor<'de> for QuorumVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer approver count")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        Ok(i64::try_from(v).unwrap_or(i64::MAX))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<i64, E> {
        Ok(i64::try_from(v).unwrap_or(if v < 0 { i64::MIN } else { i64::MAX }))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<i64, E> {
        Ok(i64::try_from(v).unwrap_or(i64::MAX))
    }

    // Oversized integers may arrive as whole floats; `as` saturates
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        if v.is_finite() && v.fract() == 0.0 {
            Ok(v as i64)
        } else {
            Err(E::invalid_value(Unexpected::Float(v), &self))
        }
    }
}

impl RuleRecord {
    pub fn new<I, U>(label: impl Into<String>, users: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<String>,
    {
        Self {
            label: label.into(),
            users: users.into_iter().map(Into::into).collect(),
            num_approvers_required: DEFAULT_NUM_APPROVERS,
            requester_must_be_authorized: false,
        }
    }

    pub fn with_quorum(mut self, num_approvers_required: i64) -> Self {
        self.num_approvers_required = num_approvers_required;
        self
    }

    pub fn requester_must_be_authorized(mut self, required: bool) -> Self {
        self.requester_must_be_authorized = required;
        self
    }

    /// Approvers that can count toward the quorum
    ///
    /// When the requester must belong to the group, one member is the
    /// requester and can never approve their own request.
    pub fn eligible_approvers(&self, group_size: usize) -> usize {
        if self.requester_must_be_authorized {
            group_size.saturating_sub(1)
        } else {
            group_size
        }
    }
}

/// Validated policy for one label
///
/// Only constructed by the loader after validation, so the group is
/// non-empty and duplicate-free and the quorum is satisfiable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    label: Label,
    users: HashSet<UserId>,
    num_approvers_required: NonZeroU32,
    requester_must_be_authorized: bool,
}

impl Rule {
    pub(crate) fn new(
        label: Label,
        users: HashSet<UserId>,
        num_approvers_required: NonZeroU32,
        requester_must_be_authorized: bool,
    ) -> Self {
        Self {
            label,
            users,
            num_approvers_required,
            requester_must_be_authorized,
        }
    }

    #[inline]
    pub fn label(&self) -> &Label {
        &self.label
    }

    #[inline]
    pub fn users(&self) -> &HashSet<UserId> {
        &self.users
    }

    #[inline]
    pub fn is_member(&self, user: &UserId) -> bool {
        self.users.contains(user)
    }

    #[inline]
    pub fn num_approvers_required(&self) -> u32 {
        self.num_approvers_required.get()
    }

    #[inline]
    pub fn requester_must_be_authorized(&self) -> bool {
        self.requester_must_be_authorized
    }

    /// Group members sorted, for stable diagnostic output
    pub fn sorted_users(&self) -> Vec<&UserId> {
        let mut users: Vec<&UserId> = self.users.iter().collect();
        users.sort();
        users
    }
}
