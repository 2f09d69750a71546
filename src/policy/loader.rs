/*!
 * Rule Loader
 * Parses declarative policy documents into validated rule tables
 *
 * A policy document is YAML: records separated by `---`, `#` comments, each
 * record a mapping with the fields below. A document may also hold a sequence
 * of record mappings.
 *
 * ```yaml
 * label: prod_admin_approval
 * users: [prod1, prod2, prod3]
 * num_approvers_required: 2
 * requester_must_be_authorized: true
 * ```
 */

use super::rule::RuleRecord;
use super::table::RuleTable;
use super::validator::PolicyValidator;
use crate::core::env_flag;
use crate::core::errors::{LoadError, LoadResult, PolicyViolation};
use crate::core::limits::{ENV_POLICY_STRICT, MAX_POLICY_DOCUMENT_BYTES};
use crate::evaluator::traits::{ExactMatch, IdentityResolver};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fields a record may carry
pub const RECOGNIZED_FIELDS: [&str; 4] = [
    "label",
    "users",
    "num_approvers_required",
    "requester_must_be_authorized",
];

/// Loader behaviour switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Unknown fields fail the load instead of producing warnings
    pub strict: bool,
}

impl LoadOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Read options from the environment
    ///
    /// - APPROVAL_POLICY_STRICT: `1` or `true` enables strict mode
    pub fn from_env() -> Self {
        Self {
            strict: env_flag(ENV_POLICY_STRICT),
        }
    }
}

/// A successfully loaded policy plus non-fatal diagnostics
#[derive(Debug, Clone)]
pub struct LoadedPolicy {
    pub table: RuleTable,
    pub warnings: Vec<PolicyViolation>,
}

/// Policy document loader
#[derive(Clone)]
pub struct PolicyLoader {
    options: LoadOptions,
    resolver: Arc<dyn IdentityResolver>,
}

impl Default for PolicyLoader {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

impl PolicyLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            resolver: Arc::new(ExactMatch),
        }
    }

    /// Canonicalize group members with `resolver` while loading
    pub fn with_resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn options(&self) -> LoadOptions {
        self.options
    }

    /// Resolver used for group members; evaluators must share it
    pub fn resolver(&self) -> Arc<dyn IdentityResolver> {
        Arc::clone(&self.resolver)
    }

    /// Parse and validate a policy document
    pub fn load(&self, document: &str) -> LoadResult<LoadedPolicy> {
        if document.len() > MAX_POLICY_DOCUMENT_BYTES {
            return Err(LoadError::single(PolicyViolation::TooLarge {
                size: document.len(),
                limit: MAX_POLICY_DOCUMENT_BYTES,
            }));
        }

        let mut violations = Vec::new();
        let mut warnings = Vec::new();
        let records = self.parse(document, &mut violations, &mut warnings);

        let validator = PolicyValidator::with_resolver(self.resolver.as_ref());
        let table = match validator.validate(records.iter().map(|(doc, record)| (*doc, record))) {
            Ok(rules) if violations.is_empty() => RuleTable::from_rules(rules),
            Ok(_) => return Err(LoadError::new(violations)),
            Err(mut found) => {
                violations.append(&mut found);
                return Err(LoadError::new(violations));
            }
        };

        info!(
            rules = table.len(),
            warnings = warnings.len(),
            strict = self.options.strict,
            "Policy loaded"
        );
        Ok(LoadedPolicy { table, warnings })
    }

    /// Read a policy document from disk and load it
    pub fn load_file(&self, path: impl AsRef<Path>) -> LoadResult<LoadedPolicy> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|e| {
            LoadError::single(PolicyViolation::Unreadable {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })?;
        self.load(&document)
    }

    /// Split the document into records, collecting parse problems
    fn parse(
        &self,
        document: &str,
        violations: &mut Vec<PolicyViolation>,
        warnings: &mut Vec<PolicyViolation>,
    ) -> Vec<(usize, RuleRecord)> {
        let mut records = Vec::new();

        for (index, de) in serde_yaml::Deserializer::from_str(document).enumerate() {
            let value = match DocumentValue::deserialize(de) {
                Ok(DocumentValue(value)) => value,
                Err(e) => {
                    // The stream cannot be resynchronised after a syntax error
                    violations.push(PolicyViolation::ParseError {
                        document: index,
                        message: e.to_string(),
                    });
                    break;
                }
            };

            match value {
                Value::Null => debug!(document = index, "Skipping empty document"),
                Value::Mapping(mapping) => {
                    if let Some(record) = self.parse_record(index, mapping, violations, warnings) {
                        records.push((index, record));
                    }
                }
                Value::Sequence(items) => {
                    for item in items {
                        match item {
                            Value::Mapping(mapping) => {
                                if let Some(record) =
                                    self.parse_record(index, mapping, violations, warnings)
                                {
                                    records.push((index, record));
                                }
                            }
                            _ => violations.push(not_a_mapping(index)),
                        }
                    }
                }
                _ => violations.push(not_a_mapping(index)),
            }
        }

        records
    }

    fn parse_record(
        &self,
        document: usize,
        mapping: Mapping,
        violations: &mut Vec<PolicyViolation>,
        warnings: &mut Vec<PolicyViolation>,
    ) -> Option<RuleRecord> {
        let mut known = Mapping::new();

        for (key, value) in mapping {
            let Some(field) = key.as_str() else {
                violations.push(PolicyViolation::ParseError {
                    document,
                    message: format!("field names must be strings, found {:?}", key),
                });
                continue;
            };

            if RECOGNIZED_FIELDS.contains(&field) {
                known.insert(key, value);
                continue;
            }

            let unknown = PolicyViolation::UnknownField {
                document,
                field: field.to_string(),
            };
            if self.options.strict {
                violations.push(unknown);
            } else {
                warn!(document, field, "Ignoring unknown policy field");
                warnings.push(unknown);
            }
        }

        // A missing or null group is reported as an empty group by the validator
        let users = known
            .entry(Value::from("users"))
            .or_insert(Value::Sequence(Vec::new()));
        if users.is_null() {
            *users = Value::Sequence(Vec::new());
        }

        match serde_yaml::from_value::<RuleRecord>(Value::Mapping(known)) {
            Ok(record) => Some(record),
            Err(e) => {
                violations.push(PolicyViolation::ParseError {
                    document,
                    message: e.to_string(),
                });
                None
            }
        }
    }
}

/// YAML tree that keeps integers wider than 64 bits instead of failing
///
/// Such integers are held as whole floats so an absurd quorum reaches the
/// validator and is reported as a quorum problem.
struct DocumentValue(Value);

impl<'de> Deserialize<'de> for DocumentValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DocumentVisitor).map(DocumentValue)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a YAML value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Value, E> {
        Ok(Value::Number((v as f64).into()))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Value, E> {
        Ok(Value::Number((v as f64).into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        DocumentValue::deserialize(deserializer).map(|v| v.0)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(DocumentValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut mapping = Mapping::new();
        while let Some((DocumentValue(key), DocumentValue(value))) = map.next_entry()? {
            if mapping.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate key {:?}", key)));
            }
            mapping.insert(key, value);
        }
        Ok(Value::Mapping(mapping))
    }
}

fn not_a_mapping(document: usize) -> PolicyViolation {
    PolicyViolation::ParseError {
        document,
        message: "expected a rule mapping".into(),
    }
}

/// Load a policy with default options, logging any warnings
pub fn load_policy(document: &str) -> LoadResult<RuleTable> {
    PolicyLoader::default().load(document).map(|loaded| loaded.table)
}
