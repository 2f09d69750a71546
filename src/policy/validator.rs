/*!
 * Policy Validator
 * Static checks run at load time before a rule table is built
 *
 * Every violation is collected, not just the first, so an operator can fix a
 * policy in one pass. A record only becomes a `Rule` if the whole batch is
 * clean.
 */

use super::rule::{Rule, RuleRecord};
use crate::core::errors::PolicyViolation;
use crate::core::limits::{MAX_GROUP_SIZE, MAX_RULES};
use crate::core::types::{Label, UserId};
use crate::evaluator::traits::{ExactMatch, IdentityResolver};
use ahash::HashSet;
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use tracing::debug;

/// Validates raw records and turns them into rules
pub struct PolicyValidator<'a> {
    resolver: &'a dyn IdentityResolver,
}

impl Default for PolicyValidator<'static> {
    fn default() -> Self {
        Self {
            resolver: &ExactMatch,
        }
    }
}

impl<'a> PolicyValidator<'a> {
    /// Validator that canonicalizes group members with `resolver`
    pub fn with_resolver(resolver: &'a dyn IdentityResolver) -> Self {
        Self { resolver }
    }

    /// Validate a batch of `(document index, record)` pairs
    pub fn validate<'r, I>(&self, records: I) -> Result<Vec<Rule>, Vec<PolicyViolation>>
    where
        I: IntoIterator<Item = (usize, &'r RuleRecord)>,
    {
        let mut violations = Vec::new();
        let mut rules = Vec::new();
        let mut seen: BTreeMap<&'r str, usize> = BTreeMap::new();

        for (count, (document, record)) in records.into_iter().enumerate() {
            if count >= MAX_RULES {
                violations.push(PolicyViolation::ParseError {
                    document,
                    message: format!("policy exceeds {} rules", MAX_RULES),
                });
                break;
            }

            let mut duplicate = false;
            if !record.label.is_empty() {
                if let Some(&first) = seen.get(record.label.as_str()) {
                    violations.push(PolicyViolation::DuplicateLabel {
                        label: record.label.clone(),
                        first,
                        document,
                    });
                    duplicate = true;
                } else {
                    seen.insert(record.label.as_str(), document);
                }
            }

            // A duplicate is still checked so its own violations are reported
            let rule = self.check_record(document, record, &mut violations);
            if let Some(rule) = rule.filter(|_| !duplicate) {
                rules.push(rule);
            }
        }

        if violations.is_empty() {
            Ok(rules)
        } else {
            debug!(count = violations.len(), "Policy validation failed");
            Err(violations)
        }
    }

    /// Check one record, pushing violations; returns the rule if it is clean
    fn check_record(
        &self,
        document: usize,
        record: &RuleRecord,
        violations: &mut Vec<PolicyViolation>,
    ) -> Option<Rule> {
        let before = violations.len();

        if record.label.is_empty() {
            violations.push(PolicyViolation::ParseError {
                document,
                message: "`label` must be a non-empty string".into(),
            });
        }

        if record.users.is_empty() {
            violations.push(PolicyViolation::EmptyGroup {
                label: record.label.clone(),
            });
        } else if record.users.len() > MAX_GROUP_SIZE {
            violations.push(PolicyViolation::ParseError {
                document,
                message: format!(
                    "rule '{}' lists {} users, limit is {}",
                    record.label,
                    record.users.len(),
                    MAX_GROUP_SIZE
                ),
            });
        }

        let mut users: HashSet<UserId> = HashSet::default();
        let mut reported_empty = false;
        for raw in &record.users {
            let user = self.resolver.canonicalize(raw);
            if user.is_empty() {
                if !reported_empty {
                    violations.push(PolicyViolation::EmptyIdentity {
                        label: record.label.clone(),
                    });
                    reported_empty = true;
                }
                continue;
            }
            if users.contains(&user) {
                violations.push(PolicyViolation::DuplicateUser {
                    label: record.label.clone(),
                    user: user.to_string(),
                });
                continue;
            }
            users.insert(user);
        }

        // Quorum is only meaningful against a non-empty group
        let quorum = if users.is_empty() {
            None
        } else {
            let available = record.eligible_approvers(users.len());
            let required = record.num_approvers_required;
            let quorum = u32::try_from(required)
                .ok()
                .and_then(NonZeroU32::new)
                .filter(|q| q.get() as usize <= available);
            if quorum.is_none() {
                violations.push(PolicyViolation::InvalidQuorum {
                    label: record.label.clone(),
                    required,
                    available,
                });
            }
            quorum
        };

        if violations.len() > before {
            return None;
        }

        quorum.map(|q| {
            Rule::new(
                Label::new(&record.label),
                users,
                q,
                record.requester_must_be_authorized,
            )
        })
    }
}
