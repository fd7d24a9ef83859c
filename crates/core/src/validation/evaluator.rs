//! Built-in rule evaluators. Pure logic, no state.

use std::sync::LazyLock;

use regex::Regex;
use validator::ValidateEmail;

use super::registry::{with_param, Evaluator, FieldLevel, Registry};
use crate::value::Value;

static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?[0-9]+(?:\.[0-9]+)?$").expect("valid regex"));
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));
static ALPHA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]+$").expect("valid regex"));
static ALPHANUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("valid regex"));

/// Install every built-in rule into `registry`.
pub(crate) fn register_builtins(registry: &mut Registry) {
    registry.insert_rule("required", evaluate_required);
    registry.insert_rule("numeric", evaluate_numeric);
    registry.insert_rule("number", evaluate_number);
    registry.insert_rule("alpha", evaluate_alpha);
    registry.insert_rule("alphanum", evaluate_alphanum);
    registry.insert_rule("email", evaluate_email);

    registry.insert_rule("min", size_rule(|m, n| m >= n));
    registry.insert_rule("max", size_rule(|m, n| m <= n));
    registry.insert_rule("len", size_rule(|m, n| m == n));
    registry.insert_rule("gt", size_rule(|m, n| m > n));
    registry.insert_rule("gte", size_rule(|m, n| m >= n));
    registry.insert_rule("lt", size_rule(|m, n| m < n));
    registry.insert_rule("lte", size_rule(|m, n| m <= n));

    registry.insert_rule("eq", evaluate_eq);
    registry.insert_rule("ne", evaluate_ne);
    registry.insert_rule(
        "oneof",
        with_param(parse_options, |field: &FieldLevel<'_>, options: &Vec<String>| {
            evaluate_oneof(field, options)
        }),
    );
    registry.insert_rule("eqfield", evaluate_eqfield);
    registry.insert_rule("nefield", evaluate_nefield);
}

// ---------------------------------------------------------------------------
// Parameter parsers
// ---------------------------------------------------------------------------

fn parse_bound(param: &str) -> Result<f64, String> {
    match param.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        Ok(_) => Err(format!("'{param}' is not a finite number")),
        Err(_) => Err(format!("'{param}' is not a number")),
    }
}

fn parse_options(param: &str) -> Result<Vec<String>, String> {
    let options: Vec<String> = param.split_whitespace().map(str::to_string).collect();
    if options.is_empty() {
        return Err("expected at least one option".to_string());
    }
    Ok(options)
}

/// A rule comparing [`measure`] of the value against a numeric parameter.
fn size_rule(cmp: fn(f64, f64) -> bool) -> impl Evaluator {
    with_param(parse_bound, move |field: &FieldLevel<'_>, n: &f64| {
        measure(field.value()).is_some_and(|m| cmp(m, *n))
    })
}

/// The quantity size rules compare: character count for strings, element
/// count for containers, the number itself for numerics.
fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::Int(_) | Value::Float(_) => value.as_f64(),
        _ => value.len().map(|n| n as f64),
    }
}

// ---------------------------------------------------------------------------
// Evaluators
// ---------------------------------------------------------------------------

fn evaluate_required(field: &FieldLevel<'_>) -> bool {
    !field.value().is_zero()
}

fn matches_str(field: &FieldLevel<'_>, re: &Regex) -> bool {
    field.value().as_str().is_some_and(|s| re.is_match(s))
}

fn evaluate_numeric(field: &FieldLevel<'_>) -> bool {
    field.value().is_numeric() || matches_str(field, &NUMERIC_RE)
}

fn evaluate_number(field: &FieldLevel<'_>) -> bool {
    match field.value() {
        Value::Int(n) => *n >= 0,
        Value::Float(x) => *x >= 0.0 && x.fract() == 0.0,
        _ => matches_str(field, &NUMBER_RE),
    }
}

fn evaluate_alpha(field: &FieldLevel<'_>) -> bool {
    matches_str(field, &ALPHA_RE)
}

fn evaluate_alphanum(field: &FieldLevel<'_>) -> bool {
    matches_str(field, &ALPHANUM_RE)
}

fn evaluate_email(field: &FieldLevel<'_>) -> bool {
    field.value().as_str().is_some_and(|s| s.validate_email())
}

/// Equality of a value with the textual parameter.
fn equals_param(value: &Value, param: &str) -> Option<bool> {
    match value {
        Value::String(s) => Some(s == param),
        Value::Bool(b) => param.parse::<bool>().ok().map(|p| p == *b),
        Value::Int(_) | Value::Float(_) | Value::Seq(_) | Value::Map(_) => {
            let n = param.parse::<f64>().ok()?;
            measure(value).map(|m| m == n)
        }
        Value::Null | Value::Record(_) => None,
    }
}

fn evaluate_eq(field: &FieldLevel<'_>) -> bool {
    equals_param(field.value(), field.param()).unwrap_or(false)
}

fn evaluate_ne(field: &FieldLevel<'_>) -> bool {
    equals_param(field.value(), field.param()).is_some_and(|eq| !eq)
}

fn evaluate_oneof(field: &FieldLevel<'_>, options: &[String]) -> bool {
    match field.value() {
        Value::String(_) | Value::Int(_) | Value::Float(_) => {
            let rendered = field.value().to_string();
            options.iter().any(|o| *o == rendered)
        }
        _ => false,
    }
}

/// Value equality that treats `Int(2)` and `Float(2.0)` as equal.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn evaluate_eqfield(field: &FieldLevel<'_>) -> bool {
    field
        .related()
        .is_some_and(|other| values_equal(field.value(), other))
}

fn evaluate_nefield(field: &FieldLevel<'_>) -> bool {
    field
        .related()
        .map_or(true, |other| !values_equal(field.value(), other))
}
