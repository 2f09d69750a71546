/*!
 * Rule Table
 * Immutable label -> rule mapping queried by the evaluator
 */

use super::rule::{Rule, RuleRecord};
use super::validator::PolicyValidator;
use crate::core::errors::{LoadError, LoadResult};
use crate::core::types::Label;
use crate::evaluator::traits::IdentityResolver;
use std::collections::BTreeMap;

/// Outcome of a table lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleLookup<'a> {
    Found(&'a Rule),
    NoRuleForLabel,
}

impl<'a> RuleLookup<'a> {
    pub fn rule(self) -> Option<&'a Rule> {
        match self {
            Self::Found(rule) => Some(rule),
            Self::NoRuleForLabel => None,
        }
    }
}

/// Read-only rule table for one policy version
///
/// Keys are kept sorted so diagnostic iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: BTreeMap<Label, Rule>,
}

impl RuleTable {
    /// Empty table; every label is unknown
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate records and build a table, with exact identity matching
    pub fn from_records<I>(records: I) -> LoadResult<Self>
    where
        I: IntoIterator<Item = RuleRecord>,
    {
        let records: Vec<RuleRecord> = records.into_iter().collect();
        Self::build(PolicyValidator::default(), records.iter().enumerate())
    }

    /// Validate records and build a table, canonicalizing group members
    pub fn from_records_with<I>(records: I, resolver: &dyn IdentityResolver) -> LoadResult<Self>
    where
        I: IntoIterator<Item = RuleRecord>,
    {
        let records: Vec<RuleRecord> = records.into_iter().collect();
        Self::build(
            PolicyValidator::with_resolver(resolver),
            records.iter().enumerate(),
        )
    }

    fn build<'r, I>(validator: PolicyValidator<'_>, records: I) -> LoadResult<Self>
    where
        I: IntoIterator<Item = (usize, &'r RuleRecord)>,
    {
        let rules = validator.validate(records).map_err(LoadError::new)?;
        Ok(Self::from_rules(rules))
    }

    /// Assemble already-validated rules
    pub(crate) fn from_rules(rules: Vec<Rule>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|rule| (rule.label().clone(), rule))
                .collect(),
        }
    }

    /// Look up the rule governing `label`
    #[inline]
    pub fn lookup(&self, label: &Label) -> RuleLookup<'_> {
        match self.rules.get(label) {
            Some(rule) => RuleLookup::Found(rule),
            None => RuleLookup::NoRuleForLabel,
        }
    }

    pub fn get(&self, label: &str) -> Option<&Rule> {
        self.rules.get(label)
    }

    /// Labels in lexicographic order
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.rules.keys()
    }

    /// Rules in label order
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
