//! Value walker: applies compiled rulesets to a value tree.

use std::collections::HashMap;

use super::registry::{FieldLevel, Registry};
use super::rules::{Dive, RuleGroup, Ruleset, Violation};
use super::schema::CompiledSchema;
use crate::config::ValidatorConfig;
use crate::value::{Record, Value};

static NULL: Value = Value::Null;

/// One validation pass. Collects violations depth-first.
pub(crate) struct Walker<'v> {
    registry: &'v Registry,
    schemas: &'v HashMap<String, CompiledSchema>,
    config: ValidatorConfig,
    violations: Vec<Violation>,
}

/// Where a ruleset is being applied.
#[derive(Clone, Copy)]
pub(crate) struct Scope<'a> {
    /// Record owning the value, for sibling lookups.
    pub(crate) parent: Option<&'a Record>,
    /// Comparison value of a two-value check.
    pub(crate) other: Option<&'a Value>,
}

impl Scope<'_> {
    pub(crate) const ROOT: Scope<'static> = Scope {
        parent: None,
        other: None,
    };
}

impl<'v> Walker<'v> {
    pub(crate) fn new(
        registry: &'v Registry,
        schemas: &'v HashMap<String, CompiledSchema>,
        config: ValidatorConfig,
    ) -> Self {
        Self {
            registry,
            schemas,
            config,
            violations: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> Vec<Violation> {
        self.violations
    }

    /// Entry point of [`Validator::validate`](super::engine::Validator::validate).
    ///
    /// A record is walked directly. A sequence or mapping at the root has no
    /// rules of its own, but the records it holds are walked at `[i]` or
    /// `[key]`.
    pub(crate) fn walk_root(&mut self, value: &Value, path: &str) {
        match value {
            Value::Record(record) => self.walk_record(record, path),
            Value::Seq(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.walk_root(item, &format!("{path}[{i}]"));
                }
            }
            Value::Map(entries) => {
                let mixed = mixed_key_kinds(entries);
                for (key, item) in entries {
                    self.walk_root(item, &format!("{path}[{}]", key_segment(key, mixed)));
                }
            }
            _ => {
                tracing::debug!(kind = value.kind(), "Root value holds no records");
            }
        }
    }

    /// Field rules first (declared order), then undeclared nested records,
    /// then the record's struct-level checks.
    pub(crate) fn walk_record(&mut self, record: &Record, path: &str) {
        let schema = self.schemas.get(record.type_tag());

        if let Some(schema) = schema {
            for (name, rules) in &schema.fields {
                let value = record.get(name).unwrap_or(&NULL);
                let scope = Scope {
                    parent: Some(record),
                    other: None,
                };
                self.apply(rules, value, scope, &join(path, name));
            }
        }

        for (name, value) in record.fields() {
            if schema.is_some_and(|s| s.declares(name)) {
                continue;
            }
            if let Value::Record(nested) = value {
                self.walk_record(nested, &join(path, name));
            }
        }

        for check in self.registry.struct_checks(record.type_tag()) {
            self.violations
                .extend(check.check(record).into_iter().map(|v| v.rebase(path)));
        }
    }

    /// Apply `set` to `value` at `path`, then descend into its contents.
    pub(crate) fn apply(&mut self, set: &Ruleset, value: &Value, scope: Scope<'_>, path: &str) {
        if set.omit_empty && value.is_zero() {
            return;
        }

        for group in &set.groups {
            let required = group.is_required();
            if required && !self.config.required_struct && matches!(value, Value::Record(_)) {
                continue;
            }
            if self.group_passes(group, value, scope) {
                continue;
            }
            self.violations.extend(
                group
                    .alternatives
                    .iter()
                    .map(|rule| Violation::new(path, rule.name.as_str(), rule.param.as_str())),
            );
            // Nothing else is meaningful for a missing value.
            if required {
                return;
            }
            if self.config.field_fail_fast {
                break;
            }
        }

        self.descend(set.dive.as_deref(), value, scope, path);
    }

    fn descend(&mut self, dive: Option<&Dive>, value: &Value, scope: Scope<'_>, path: &str) {
        let element_scope = Scope {
            parent: scope.parent,
            other: None,
        };
        match (value, dive) {
            (Value::Record(record), _) => self.walk_record(record, path),
            (Value::Seq(items), Some(dive)) => {
                if dive.keys.is_some() {
                    tracing::debug!(path = %path, "Ignoring keys section on a sequence");
                }
                for (i, item) in items.iter().enumerate() {
                    self.apply(&dive.elements, item, element_scope, &format!("{path}[{i}]"));
                }
            }
            (Value::Map(entries), Some(dive)) => {
                let mixed = mixed_key_kinds(entries);
                for (key, item) in entries {
                    let segment = key_segment(key, mixed);
                    if let Some(keys) = &dive.keys {
                        self.apply(keys, key, element_scope, &format!("{path}{{{segment}}}"));
                    }
                    self.apply(&dive.elements, item, element_scope, &format!("{path}[{segment}]"));
                }
            }
            (Value::Null, Some(_)) | (_, None) => {}
            (_, Some(_)) => {
                tracing::debug!(path = %path, kind = value.kind(), "Ignoring dive on a scalar value");
            }
        }
    }

    fn group_passes(&self, group: &RuleGroup, value: &Value, scope: Scope<'_>) -> bool {
        group.alternatives.iter().any(|rule| {
            let evaluator = match rule.evaluator() {
                Some(evaluator) => evaluator,
                None => match self.registry.lookup(&rule.name) {
                    Ok(evaluator) => evaluator,
                    Err(_) => return false,
                },
            };
            let mut field = FieldLevel::new(value, &rule.param);
            if let Some(parent) = scope.parent {
                field = field.with_parent(parent);
            }
            if let Some(other) = scope.other {
                field = field.with_other(other);
            }
            evaluator.evaluate(&field)
        })
    }
}

/// Whether a mapping mixes string keys with keys of other kinds.
fn mixed_key_kinds(entries: &[(Value, Value)]) -> bool {
    let strings = entries.iter().filter(|(k, _)| matches!(k, Value::String(_))).count();
    strings != 0 && strings != entries.len()
}

/// Path segment of a map key. Keys render bare (`Schools[SMP]`, `Ids[1]`);
/// in a mapping that mixes key kinds, string keys are quoted so `"1"` and
/// `1` stay distinguishable.
fn key_segment(key: &Value, mixed: bool) -> String {
    match key {
        Value::String(s) if mixed => format!("{s:?}"),
        _ => key.to_string(),
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(expr: &str, value: &Value) -> Vec<Violation> {
        run_with(ValidatorConfig::default(), expr, value)
    }

    fn run_with(config: ValidatorConfig, expr: &str, value: &Value) -> Vec<Violation> {
        let registry = Registry::new();
        let schemas = HashMap::new();
        let set = registry.compile(expr).unwrap();
        let mut walker = Walker::new(&registry, &schemas, config);
        walker.apply(&set, value, Scope::ROOT, "Field");
        walker.finish()
    }

    fn summary(violations: &[Violation]) -> Vec<(String, String)> {
        violations
            .iter()
            .map(|v| (v.path.clone(), v.rule.clone()))
            .collect()
    }

    #[test]
    fn collects_every_failing_group() {
        let got = run("required,numeric,min=5,max=10", &Value::from("abc"));
        assert_eq!(
            summary(&got),
            [
                ("Field".to_string(), "numeric".to_string()),
                ("Field".to_string(), "min".to_string()),
            ]
        );
    }

    #[test]
    fn failed_required_stops_the_value() {
        let got = run("required,min=3", &Value::from(""));
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].rule, "required");
    }

    #[test]
    fn fail_fast_stops_at_first_group() {
        let config = ValidatorConfig {
            field_fail_fast: true,
            ..ValidatorConfig::default()
        };
        let got = run_with(config, "numeric,min=5", &Value::from("abc"));
        assert_eq!(summary(&got), [("Field".to_string(), "numeric".to_string())]);
    }

    #[test]
    fn alternation_reports_each_alternative() {
        let got = run("email|numeric", &Value::from("laksa"));
        let rules: Vec<&str> = got.iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(rules, ["email", "numeric"]);
        assert!(run("email|numeric", &Value::from("12345")).is_empty());
    }

    #[test]
    fn omitempty_skips_zero_values() {
        assert!(run("omitempty,email", &Value::from("")).is_empty());
        assert_eq!(run("omitempty,email", &Value::from("nope")).len(), 1);
    }

    #[test]
    fn dive_reports_element_indices() {
        let hobbies = Value::from(vec!["Gaming", "Coding", "", "X"]);
        let got = run("required,dive,required,min=3", &hobbies);
        assert_eq!(
            summary(&got),
            [
                ("Field[2]".to_string(), "required".to_string()),
                ("Field[3]".to_string(), "min".to_string()),
            ]
        );
    }

    #[test]
    fn empty_container_under_required_does_not_dive() {
        let got = run("required,dive,required", &Value::Seq(vec![]));
        assert_eq!(summary(&got), [("Field".to_string(), "required".to_string())]);
        let got = run("required,dive,keys,required,endkeys", &Value::Map(vec![]));
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn map_keys_and_values_use_distinct_paths() {
        let wallet = Value::Map(vec![
            (Value::from("BCA"), Value::from(1_000_000)),
            (Value::from("MANDIRI"), Value::from(0)),
            (Value::from(""), Value::from(1001)),
        ]);
        let mut got = summary(&run("dive,keys,required,endkeys,required,gt=1000", &wallet));
        got.sort();
        assert_eq!(
            got,
            [
                ("Field[MANDIRI]".to_string(), "required".to_string()),
                ("Field{}".to_string(), "required".to_string()),
            ]
        );
    }

    #[test]
    fn dive_on_scalar_is_ignored() {
        assert!(run("dive,required", &Value::from("x")).is_empty());
        assert!(run("dive,required", &Value::Null).is_empty());
    }

    #[test]
    fn required_struct_toggle() {
        let empty = Value::Record(Record::new("Address").field("City", ""));
        assert_eq!(run("required", &empty).len(), 1);
        let config = ValidatorConfig {
            required_struct: false,
            ..ValidatorConfig::default()
        };
        assert!(run_with(config, "required", &empty).is_empty());
        assert_eq!(run_with(config, "required", &Value::Null).len(), 1);
    }

    #[test]
    fn keys_section_on_sequence_only_checks_elements() {
        let items = Value::from(vec!["", "x"]);
        let got = run("dive,keys,required,endkeys,required", &items);
        assert_eq!(summary(&got), [("Field[0]".to_string(), "required".to_string())]);
    }

    #[test]
    fn mixed_key_kinds_get_distinct_paths() {
        let ids = Value::Map(vec![
            (Value::from(1), Value::from("")),
            (Value::from("1"), Value::from("")),
        ]);
        let paths: Vec<String> = run("dive,required", &ids)
            .into_iter()
            .map(|v| v.path)
            .collect();
        assert_eq!(paths, ["Field[1]", "Field[\"1\"]"]);
    }

    #[test]
    fn uniform_string_keys_stay_bare() {
        let schools = Value::Map(vec![(Value::from("SMP"), Value::from(""))]);
        let got = run("dive,keys,min=5,endkeys,required", &schools);
        let mut paths: Vec<String> = got.into_iter().map(|v| v.path).collect();
        paths.sort();
        assert_eq!(paths, ["Field[SMP]", "Field{SMP}"]);
    }

    #[test]
    fn root_sequence_walks_nested_records_only() {
        let registry = Registry::new();
        let schemas = HashMap::from([(
            "Address".to_string(),
            crate::validation::schema::RecordSchema::new("Address")
                .field("City", "required")
                .compile(&registry)
                .unwrap(),
        )]);
        let mut walker = Walker::new(&registry, &schemas, ValidatorConfig::default());
        let batch = Value::from(vec![
            Value::from("not a record"),
            Value::from(Record::new("Address").field("City", "")),
        ]);
        walker.walk_root(&batch, "");
        let got = walker.finish();
        assert_eq!(summary(&got), [("[1].City".to_string(), "required".to_string())]);
    }

    #[test]
    fn join_builds_dotted_paths() {
        assert_eq!(join("", "Id"), "Id");
        assert_eq!(join("Address", "City"), "Address.City");
    }
}
