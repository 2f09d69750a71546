/*!
 * Evaluator Configuration
 * Fail-closed defaults with explicit opt-ins
 */

use crate::core::limits::ENV_UNKNOWN_LABEL_POLICY;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// What to do with a target label that has no rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownLabelPolicy {
    /// Fail closed: the label denies the request
    #[default]
    Deny,
    /// The label imposes no requirement
    Allow,
}

impl FromStr for UnknownLabelPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deny" => Ok(Self::Deny),
            "allow" => Ok(Self::Allow),
            other => Err(format!(
                "unknown label policy '{}', expected 'deny' or 'allow'",
                other
            )),
        }
    }
}

impl fmt::Display for UnknownLabelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deny => f.write_str("deny"),
            Self::Allow => f.write_str("allow"),
        }
    }
}

/// Evaluator settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    #[serde(default)]
    pub unknown_label_policy: UnknownLabelPolicy,
}

impl EvaluatorConfig {
    pub fn with_unknown_label_policy(mut self, policy: UnknownLabelPolicy) -> Self {
        self.unknown_label_policy = policy;
        self
    }

    /// Read settings from the environment
    ///
    /// - APPROVAL_UNKNOWN_LABEL_POLICY: `deny` (default) or `allow`
    ///
    /// Unparseable values keep the fail-closed default.
    pub fn from_env() -> Self {
        let unknown_label_policy = match std::env::var(ENV_UNKNOWN_LABEL_POLICY) {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!(error = %e, "Ignoring {}", ENV_UNKNOWN_LABEL_POLICY);
                UnknownLabelPolicy::Deny
            }),
            Err(_) => UnknownLabelPolicy::Deny,
        };
        Self {
            unknown_label_policy,
        }
    }
}
