/*!
 * Decision Reporter
 * Stable, machine-readable rendering of evaluator output
 *
 * Entries are ordered by label so identical inputs always produce identical
 * reports. Only identities the caller supplied can appear, and label entries
 * carry counts rather than names.
 */

use crate::core::errors::{LoadError, PolicyViolation, RequestError};
use crate::core::types::Label;
use crate::evaluator::decision::{Decision, DenialReason, LabelOutcome, LabelStatus};
use serde::{Deserialize, Serialize};
use std::process::ExitCode;

/// Top-level outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Granted,
    Denied,
}

/// Report entry for one label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelReport {
    pub label: Label,
    pub status: LabelStatus,
    pub missing_approvers_count: u32,
    pub missing_requester_authorization: bool,
    pub unknown_label: bool,
}

impl From<&LabelOutcome> for LabelReport {
    fn from(outcome: &LabelOutcome) -> Self {
        Self {
            label: outcome.label.clone(),
            status: outcome.status,
            missing_approvers_count: outcome.missing_approvers_count(),
            missing_requester_authorization: outcome.missing_requester_authorization,
            unknown_label: outcome.unknown_label,
        }
    }
}

/// Structured decision report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionReport {
    pub decision: DecisionStatus,
    pub per_label: Vec<LabelReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<DenialReason>,
}

impl DecisionReport {
    pub fn is_granted(&self) -> bool {
        self.decision == DecisionStatus::Granted
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<&Decision> for DecisionReport {
    fn from(decision: &Decision) -> Self {
        let mut per_label: Vec<LabelReport> =
            decision.per_label().iter().map(LabelReport::from).collect();
        per_label.sort_by(|a, b| a.label.cmp(&b.label));

        let mut reasons = decision.reasons().to_vec();
        reasons.sort_by(|a, b| a.label().cmp(b.label()));

        Self {
            decision: if decision.is_granted() {
                DecisionStatus::Granted
            } else {
                DecisionStatus::Denied
            },
            per_label,
            reasons,
        }
    }
}

/// Report for calls that did not produce a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum FailureReport {
    InvalidRequest { reason: String },
    LoadError { violations: Vec<PolicyViolation> },
}

impl From<&RequestError> for FailureReport {
    fn from(err: &RequestError) -> Self {
        match err {
            RequestError::InvalidRequest { reason } => Self::InvalidRequest {
                reason: reason.clone(),
            },
        }
    }
}

impl From<&LoadError> for FailureReport {
    fn from(err: &LoadError) -> Self {
        Self::LoadError {
            violations: err.violations.clone(),
        }
    }
}

/// Process exit status for command-line use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExitStatus {
    Granted = 0,
    Denied = 1,
    InvalidRequest = 2,
    LoadError = 3,
}

impl ExitStatus {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<&Decision> for ExitStatus {
    fn from(decision: &Decision) -> Self {
        if decision.is_granted() {
            Self::Granted
        } else {
            Self::Denied
        }
    }
}

impl From<&FailureReport> for ExitStatus {
    fn from(report: &FailureReport) -> Self {
        match report {
            FailureReport::InvalidRequest { .. } => Self::InvalidRequest,
            FailureReport::LoadError { .. } => Self::LoadError,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}
