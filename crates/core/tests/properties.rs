//! Property tests for the engine's universal laws.

use proptest::prelude::*;
use vetter_core::{FieldLevel, Record, RecordSchema, Validator, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn contains_a(field: &FieldLevel<'_>) -> bool {
    field.value().as_str().is_some_and(|s| s.contains('a'))
}

fn shorter_than_four(field: &FieldLevel<'_>) -> bool {
    field.value().as_str().is_some_and(|s| s.chars().count() < 4)
}

fn custom_validator() -> Validator {
    let mut builder = Validator::builder();
    builder
        .register_rule("contains_a", contains_a)
        .unwrap()
        .register_rule("short", shorter_than_four)
        .unwrap();
    builder.build().unwrap()
}

/// A validator whose `Doc` schema marks every name `required`.
fn required_fields(names: &[String]) -> Validator {
    let schema = names
        .iter()
        .fold(RecordSchema::new("Doc"), |schema, name| {
            schema.field(name.as_str(), "required")
        });
    let mut builder = Validator::builder();
    builder.register_schema(schema).unwrap();
    builder.build().unwrap()
}

fn field_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[A-Z][a-z]{1,6}", 1..6).prop_map(|set| set.into_iter().collect())
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn present_required_fields_pass(
        names in field_names(),
        filler in "[a-z0-9]{1,8}",
    ) {
        let validator = required_fields(&names);
        let record = names
            .iter()
            .fold(Record::new("Doc"), |r, n| r.field(n.as_str(), filler.as_str()));
        prop_assert!(validator.validate(&record).is_empty());
    }

    #[test]
    fn one_missing_field_yields_one_violation(
        names in field_names(),
        pick in any::<prop::sample::Index>(),
    ) {
        let validator = required_fields(&names);
        let missing = &names[pick.index(names.len())];
        let record = names
            .iter()
            .filter(|n| *n != missing)
            .fold(Record::new("Doc"), |r, n| r.field(n.as_str(), "present"));

        let violations = validator.validate(&record);
        prop_assert_eq!(violations.len(), 1);
        prop_assert_eq!(&violations[0].path, missing);
        prop_assert_eq!(violations[0].rule.as_str(), "required");
    }

    #[test]
    fn custom_rule_matches_direct_call(input in "[a-z]{0,8}") {
        let validator = custom_validator();
        let value = Value::from(input.as_str());
        let direct = contains_a(&FieldLevel::new(&value, ""));
        let via_engine = validator.validate_var(&value, "contains_a").unwrap().is_empty();
        prop_assert_eq!(direct, via_engine);
    }

    #[test]
    fn alternation_passes_if_either_passes(input in "[a-z]{0,8}") {
        let validator = custom_validator();
        let value = Value::from(input.as_str());
        let field = FieldLevel::new(&value, "");
        let expected_pass = contains_a(&field) || shorter_than_four(&field);

        let violations = validator.validate_var(&value, "contains_a|short").unwrap();
        if expected_pass {
            prop_assert!(violations.is_empty());
        } else {
            let rules: Vec<&str> = violations.iter().map(|v| v.rule.as_str()).collect();
            prop_assert_eq!(rules, vec!["contains_a", "short"]);
        }
    }

    #[test]
    fn dive_reports_each_bad_element(items in prop::collection::vec("[a-z]{0,5}", 0..8)) {
        let validator = Validator::new();
        let violations = validator
            .validate_var(&items, "required,dive,required,min=3")
            .unwrap();

        if items.is_empty() {
            prop_assert_eq!(violations.len(), 1);
            prop_assert_eq!(violations[0].path.as_str(), "");
            prop_assert_eq!(violations[0].rule.as_str(), "required");
        } else {
            let expected: Vec<(String, &str)> = items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| match item.len() {
                    0 => Some((format!("[{i}]"), "required")),
                    1 | 2 => Some((format!("[{i}]"), "min")),
                    _ => None,
                })
                .collect();
            let got: Vec<(String, &str)> = violations
                .iter()
                .map(|v| (v.path.clone(), v.rule.as_str()))
                .collect();
            prop_assert_eq!(got, expected);
        }
    }
}
