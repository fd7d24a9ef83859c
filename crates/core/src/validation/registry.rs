//! Rule registry: named evaluators, aliases, and struct-level checks.
//!
//! A [`Registry`] is owned by one validator. Nothing here is global, so
//! overriding a built-in in one registry never affects another.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::evaluator;
use super::parser::{self, DIVE, END_KEYS, KEYS, OMIT_EMPTY};
use super::rules::{Ruleset, Violation};
use crate::error::{CoreError, CoreResult};
use crate::value::{Record, Value};

// ---------------------------------------------------------------------------
// Evaluator inputs
// ---------------------------------------------------------------------------

/// Everything a rule evaluator may look at for one value.
#[derive(Debug, Clone, Copy)]
pub struct FieldLevel<'a> {
    value: &'a Value,
    param: &'a str,
    parent: Option<&'a Record>,
    other: Option<&'a Value>,
}

impl<'a> FieldLevel<'a> {
    pub fn new(value: &'a Value, param: &'a str) -> Self {
        Self {
            value,
            param,
            parent: None,
            other: None,
        }
    }

    /// Attach the record that owns the value.
    pub fn with_parent(mut self, parent: &'a Record) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Attach the comparison value of a two-value check.
    pub fn with_other(mut self, other: &'a Value) -> Self {
        self.other = Some(other);
        self
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn param(&self) -> &'a str {
        self.param
    }

    pub fn parent(&self) -> Option<&'a Record> {
        self.parent
    }

    /// The value a cross-field rule compares against.
    ///
    /// In a two-value check this is the supplied comparison value. Otherwise
    /// it is the sibling field named by the parameter.
    pub fn related(&self) -> Option<&'a Value> {
        self.other
            .or_else(|| self.parent.and_then(|p| p.get(self.param)))
    }
}

// ---------------------------------------------------------------------------
// Evaluator trait
// ---------------------------------------------------------------------------

/// A named predicate.
///
/// Evaluators must be pure and non-blocking: the same validator may be used
/// from several threads at once.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, field: &FieldLevel<'_>) -> bool;

    /// Bind a rule parameter once, at compile time.
    ///
    /// `Ok(None)` keeps this evaluator as registered. `Ok(Some(..))` replaces
    /// it for that one rule occurrence. An error rejects the parameter and
    /// becomes part of a [`CoreError::MalformedRuleExpression`].
    fn prepare(&self, _param: &str) -> Result<Option<Arc<dyn Evaluator>>, String> {
        Ok(None)
    }
}

impl<F> Evaluator for F
where
    F: Fn(&FieldLevel<'_>) -> bool + Send + Sync,
{
    fn evaluate(&self, field: &FieldLevel<'_>) -> bool {
        self(field)
    }
}

/// Evaluator with a typed parameter. See [`with_param`].
pub struct WithParam<P, Parse, Eval> {
    parse: Parse,
    eval: Arc<Eval>,
    _param: PhantomData<fn() -> P>,
}

/// Build an evaluator whose parameter is parsed by `parse`.
///
/// `parse` runs once per rule occurrence at compile time and the parsed
/// value is reused by every evaluation, so a bad parameter fails setup
/// instead of the validation call.
pub fn with_param<P, Parse, Eval>(parse: Parse, eval: Eval) -> WithParam<P, Parse, Eval>
where
    P: Send + Sync + 'static,
    Parse: Fn(&str) -> Result<P, String> + Send + Sync,
    Eval: Fn(&FieldLevel<'_>, &P) -> bool + Send + Sync + 'static,
{
    WithParam {
        parse,
        eval: Arc::new(eval),
        _param: PhantomData,
    }
}

impl<P, Parse, Eval> Evaluator for WithParam<P, Parse, Eval>
where
    P: Send + Sync + 'static,
    Parse: Fn(&str) -> Result<P, String> + Send + Sync,
    Eval: Fn(&FieldLevel<'_>, &P) -> bool + Send + Sync + 'static,
{
    /// Unbound use (a direct [`Registry::lookup`]) parses on every call.
    fn evaluate(&self, field: &FieldLevel<'_>) -> bool {
        (self.parse)(field.param()).is_ok_and(|p| (self.eval)(field, &p))
    }

    fn prepare(&self, param: &str) -> Result<Option<Arc<dyn Evaluator>>, String> {
        let param = (self.parse)(param)?;
        Ok(Some(Arc::new(Bound {
            eval: Arc::clone(&self.eval),
            param,
        })))
    }
}

/// A [`WithParam`] evaluator with its parameter already parsed.
struct Bound<P, Eval> {
    eval: Arc<Eval>,
    param: P,
}

impl<P, Eval> Evaluator for Bound<P, Eval>
where
    P: Send + Sync,
    Eval: Fn(&FieldLevel<'_>, &P) -> bool + Send + Sync,
{
    fn evaluate(&self, field: &FieldLevel<'_>) -> bool {
        (self.eval)(field, &self.param)
    }
}

/// The evaluator a compiled rule runs.
#[derive(Clone)]
pub(crate) struct Resolved(Arc<dyn Evaluator>);

impl Resolved {
    pub(crate) fn as_evaluator(&self) -> &dyn Evaluator {
        self.0.as_ref()
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolved(..)")
    }
}

impl PartialEq for Resolved {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Resolved {}

/// A struct-level check: relationships across several fields of a record.
///
/// Violations are reported relative to the record (`"Username"`), and the
/// walker rebases them onto the record's path.
pub trait StructCheck: Send + Sync {
    fn check(&self, record: &Record) -> Vec<Violation>;
}

impl<F> StructCheck for F
where
    F: Fn(&Record) -> Vec<Violation> + Send + Sync,
{
    fn check(&self, record: &Record) -> Vec<Violation> {
        self(record)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct Registry {
    rules: HashMap<String, Arc<dyn Evaluator>>,
    aliases: HashMap<String, String>,
    struct_checks: HashMap<String, Vec<Arc<dyn StructCheck>>>,
}

impl Registry {
    /// A registry preloaded with the built-in rules.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        evaluator::register_builtins(&mut registry);
        registry
    }

    /// A registry with no rules at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add or replace a rule. Names that a rule expression could never
    /// reference (structural tokens, or names containing `,` `|` `=`) are
    /// rejected.
    pub fn register_rule(
        &mut self,
        name: impl Into<String>,
        evaluator: impl Evaluator + 'static,
    ) -> CoreResult<()> {
        let name = name.into();
        check_name(&name, "invalid rule name")?;
        self.insert_rule(name, evaluator);
        Ok(())
    }

    pub(crate) fn insert_rule(
        &mut self,
        name: impl Into<String>,
        evaluator: impl Evaluator + 'static,
    ) {
        let name = name.into();
        if self.rules.insert(name.clone(), Arc::new(evaluator)).is_some() {
            tracing::debug!(rule = %name, "Overriding registered rule");
        }
    }

    /// Register a textual alias. Fails if the alias already exists; use
    /// [`Registry::override_alias`] to replace one on purpose.
    pub fn register_alias(
        &mut self,
        name: impl Into<String>,
        expansion: impl Into<String>,
    ) -> CoreResult<()> {
        let name = name.into();
        if self.aliases.contains_key(&name) {
            return Err(CoreError::DuplicateAlias(name));
        }
        self.override_alias(name, expansion)
    }

    /// Register or replace an alias.
    pub fn override_alias(
        &mut self,
        name: impl Into<String>,
        expansion: impl Into<String>,
    ) -> CoreResult<()> {
        let name = name.into();
        let expansion = expansion.into();
        check_name(&name, "invalid alias name")?;
        if expansion.trim().is_empty() {
            return Err(CoreError::malformed(&expansion, "alias expansion is empty"));
        }
        parser::parse(&expansion)?;
        self.aliases.insert(name, expansion);
        Ok(())
    }

    /// Attach a struct-level check to a record type. Checks for the same type
    /// run in registration order.
    pub fn register_struct_check(
        &mut self,
        type_tag: impl Into<String>,
        check: impl StructCheck + 'static,
    ) {
        self.struct_checks
            .entry(type_tag.into())
            .or_default()
            .push(Arc::new(check));
    }

    pub fn lookup(&self, name: &str) -> CoreResult<&dyn Evaluator> {
        self.rules
            .get(name)
            .map(|e| e.as_ref())
            .ok_or_else(|| CoreError::UnknownRule {
                expr: name.to_string(),
                rule: name.to_string(),
            })
    }

    pub fn contains_rule(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn struct_checks(&self, type_tag: &str) -> &[Arc<dyn StructCheck>] {
        self.struct_checks
            .get(type_tag)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    /// Expand aliases, parse, and resolve every rule name and parameter.
    ///
    /// Each rule of the returned ruleset carries its evaluator, so walking it
    /// needs no further lookups.
    pub fn compile(&self, expr: &str) -> CoreResult<Ruleset> {
        let expanded = parser::expand_aliases(expr, &self.aliases)?;
        let mut set = parser::parse(&expanded)?;
        self.resolve(expr, &mut set)?;
        Ok(set)
    }

    fn resolve(&self, expr: &str, set: &mut Ruleset) -> CoreResult<()> {
        for rule in set.groups.iter_mut().flat_map(|g| g.alternatives.iter_mut()) {
            let evaluator = self
                .rules
                .get(&rule.name)
                .ok_or_else(|| CoreError::UnknownRule {
                    expr: expr.to_string(),
                    rule: rule.name.clone(),
                })?;
            let prepared = evaluator.prepare(&rule.param).map_err(|reason| {
                CoreError::malformed(
                    expr,
                    format!("invalid parameter for '{}': {reason}", rule.name),
                )
            })?;
            rule.resolved = Some(Resolved(prepared.unwrap_or_else(|| Arc::clone(evaluator))));
        }
        if let Some(dive) = set.dive.as_deref_mut() {
            if let Some(keys) = dive.keys.as_mut() {
                self.resolve(expr, keys)?;
            }
            self.resolve(expr, &mut dive.elements)?;
        }
        Ok(())
    }
}

fn check_name(name: &str, reason: &str) -> CoreResult<()> {
    if name.is_empty()
        || name.contains([',', '|', '='])
        || name.chars().any(char::is_whitespace)
        || [DIVE, KEYS, END_KEYS, OMIT_EMPTY].contains(&name)
    {
        return Err(CoreError::malformed(name, reason));
    }
    Ok(())
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rules: Vec<&String> = self.rules.keys().collect();
        rules.sort();
        let mut checks: Vec<&String> = self.struct_checks.keys().collect();
        checks.sort();
        f.debug_struct("Registry")
            .field("rules", &rules)
            .field("aliases", &self.aliases)
            .field("struct_checks", &checks)
            .finish()
    }
}
