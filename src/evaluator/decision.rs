/*!
 * Decisions
 * Grant/deny outcomes with per-label diagnostics
 *
 * A denial is an ordinary value, never an error.
 */

use crate::core::types::Label;
use serde::{Deserialize, Serialize};

/// Why a label blocked the request
///
/// Within one label, reasons appear in check order: missing rule, requester
/// membership, then quorum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenialReason {
    NoRuleForLabel { label: Label },
    RequesterNotAuthorized { label: Label },
    InsufficientApprovers { label: Label, have: u32, need: u32 },
}

impl DenialReason {
    pub fn label(&self) -> &Label {
        match self {
            Self::NoRuleForLabel { label }
            | Self::RequesterNotAuthorized { label }
            | Self::InsufficientApprovers { label, .. } => label,
        }
    }
}

/// Per-label sub-decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStatus {
    Granted,
    Denied,
}

/// Diagnostic record for one target label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelOutcome {
    pub label: Label,
    pub status: LabelStatus,
    /// Authorized approvers counted, requester excluded
    pub approvals_counted: u32,
    /// Quorum of the governing rule, 0 when there is no rule
    pub approvals_required: u32,
    pub missing_requester_authorization: bool,
    pub unknown_label: bool,
}

impl LabelOutcome {
    /// Outcome for a label with no rule
    pub(crate) fn unknown(label: Label, allowed: bool) -> Self {
        Self {
            label,
            status: if allowed {
                LabelStatus::Granted
            } else {
                LabelStatus::Denied
            },
            approvals_counted: 0,
            approvals_required: 0,
            missing_requester_authorization: false,
            unknown_label: true,
        }
    }

    /// Outcome for a label whose rule was checked
    pub(crate) fn checked(
        label: Label,
        have: u32,
        need: u32,
        missing_requester_authorization: bool,
    ) -> Self {
        let status = if have >= need && !missing_requester_authorization {
            LabelStatus::Granted
        } else {
            LabelStatus::Denied
        };
        Self {
            label,
            status,
            approvals_counted: have,
            approvals_required: need,
            missing_requester_authorization,
            unknown_label: false,
        }
    }

    #[inline]
    pub fn is_granted(&self) -> bool {
        self.status == LabelStatus::Granted
    }

    /// Approvers still needed to meet the quorum
    #[inline]
    pub fn missing_approvers_count(&self) -> u32 {
        self.approvals_required.saturating_sub(self.approvals_counted)
    }

    /// Failure records for this label, in check order
    pub fn reasons(&self) -> impl Iterator<Item = DenialReason> + '_ {
        let no_rule = (self.unknown_label && !self.is_granted()).then(|| {
            DenialReason::NoRuleForLabel {
                label: self.label.clone(),
            }
        });
        let not_authorized = self.missing_requester_authorization.then(|| {
            DenialReason::RequesterNotAuthorized {
                label: self.label.clone(),
            }
        });
        let insufficient = (self.missing_approvers_count() > 0).then(|| {
            DenialReason::InsufficientApprovers {
                label: self.label.clone(),
                have: self.approvals_counted,
                need: self.approvals_required,
            }
        });
        no_rule.into_iter().chain(not_authorized).chain(insufficient)
    }
}

/// Overall decision for one access request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// `per_label` is empty unless the decision came from `explain`
    Granted { per_label: Vec<LabelOutcome> },
    /// `reasons` are sorted by label; `per_label` covers every target label
    Denied {
        reasons: Vec<DenialReason>,
        per_label: Vec<LabelOutcome>,
    },
}

impl Decision {
    #[inline]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    #[inline]
    pub fn is_denied(&self) -> bool {
        !self.is_granted()
    }

    /// Failure records; empty when granted
    pub fn reasons(&self) -> &[DenialReason] {
        match self {
            Self::Granted { .. } => &[],
            Self::Denied { reasons, .. } => reasons,
        }
    }

    pub fn per_label(&self) -> &[LabelOutcome] {
        match self {
            Self::Granted { per_label } | Self::Denied { per_label, .. } => per_label,
        }
    }
}
