//! Evaluation engine: the public validator and its builder.
//!
//! All registration happens on [`ValidatorBuilder`]. [`ValidatorBuilder::build`]
//! compiles every schema against the final registry and freezes the result
//! into an immutable [`Validator`], which is `Send + Sync` and can be shared
//! behind an `Arc` by concurrent callers.

use std::collections::HashMap;

use super::registry::{Evaluator, Registry, StructCheck};
use super::rules::{ValidationErrors, Violation};
use super::schema::{CompiledSchema, RecordSchema};
use super::walker::{Scope, Walker};
use crate::config::ValidatorConfig;
use crate::error::{CoreError, CoreResult};
use crate::value::{ToValue, Value};

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Registration phase of a [`Validator`].
#[derive(Debug)]
pub struct ValidatorBuilder {
    registry: Registry,
    schemas: Vec<RecordSchema>,
    config: ValidatorConfig,
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorBuilder {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            schemas: Vec::new(),
            config: ValidatorConfig::default(),
        }
    }

    pub fn config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Add or override a rule for this validator only.
    pub fn register_rule(
        &mut self,
        name: impl Into<String>,
        evaluator: impl Evaluator + 'static,
    ) -> CoreResult<&mut Self> {
        self.registry.register_rule(name, evaluator)?;
        Ok(self)
    }

    pub fn register_alias(
        &mut self,
        name: impl Into<String>,
        expansion: impl Into<String>,
    ) -> CoreResult<&mut Self> {
        self.registry.register_alias(name, expansion)?;
        Ok(self)
    }

    pub fn override_alias(
        &mut self,
        name: impl Into<String>,
        expansion: impl Into<String>,
    ) -> CoreResult<&mut Self> {
        self.registry.override_alias(name, expansion)?;
        Ok(self)
    }

    pub fn register_struct_check(
        &mut self,
        type_tag: impl Into<String>,
        check: impl StructCheck + 'static,
    ) -> &mut Self {
        self.registry.register_struct_check(type_tag, check);
        self
    }

    /// Declare the field rules of a record type. Compiled at [`build`](Self::build).
    pub fn register_schema(&mut self, schema: RecordSchema) -> CoreResult<&mut Self> {
        if self
            .schemas
            .iter()
            .any(|s| s.type_tag() == schema.type_tag())
        {
            return Err(CoreError::DuplicateSchema(schema.type_tag().to_string()));
        }
        self.schemas.push(schema);
        Ok(self)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Freeze registration. Fails on the first schema that does not compile.
    pub fn build(self) -> CoreResult<Validator> {
        let mut schemas = HashMap::with_capacity(self.schemas.len());
        for schema in &self.schemas {
            let compiled = schema.compile(&self.registry)?;
            schemas.insert(schema.type_tag().to_string(), compiled);
        }

        tracing::debug!(
            rules = self.registry.rule_count(),
            aliases = self.registry.alias_count(),
            schemas = schemas.len(),
            "Validator built"
        );

        Ok(Validator {
            registry: self.registry,
            schemas,
            config: self.config,
        })
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// A frozen validator. Each call returns a fresh list of violations; an empty
/// list means the value is valid.
#[derive(Debug)]
pub struct Validator {
    registry: Registry,
    schemas: HashMap<String, CompiledSchema>,
    config: ValidatorConfig,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// A validator with the built-in rules and no schemas.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            schemas: HashMap::new(),
            config: ValidatorConfig::default(),
        }
    }

    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> ValidatorConfig {
        self.config
    }

    pub fn has_schema(&self, type_tag: &str) -> bool {
        self.schemas.contains_key(type_tag)
    }

    /// Validate a record against its registered schema, recursing into
    /// nested records and running struct-level checks.
    ///
    /// A sequence or mapping of records is validated element by element,
    /// with paths starting at `[i]` or `[key]`. A bare scalar has no declared
    /// rules and always passes; use [`validate_var`](Self::validate_var) for
    /// scalars.
    pub fn validate<T: ToValue + ?Sized>(&self, value: &T) -> Vec<Violation> {
        let value = value.to_value();
        let mut walker = self.walker();
        walker.walk_root(&value, "");
        let violations = walker.finish();
        tracing::trace!(kind = value.kind(), violations = violations.len(), "Validated value");
        violations
    }

    /// [`validate`](Self::validate) as a `Result`, for use with `?`.
    pub fn check<T: ToValue + ?Sized>(&self, value: &T) -> Result<(), ValidationErrors> {
        let violations = self.validate(value);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(violations))
        }
    }

    /// Apply one ad-hoc rule expression to a single value.
    ///
    /// Violations are reported at the empty path. Errors in the expression
    /// itself are configuration errors and returned as `Err`.
    pub fn validate_var<T: ToValue + ?Sized>(
        &self,
        value: &T,
        expr: &str,
    ) -> CoreResult<Vec<Violation>> {
        self.run_var(&value.to_value(), None, expr)
    }

    /// Two-value form of [`validate_var`](Self::validate_var): cross-field
    /// rules such as `eqfield` compare `value` against `other`.
    pub fn validate_var_with_value<T, U>(
        &self,
        value: &T,
        other: &U,
        expr: &str,
    ) -> CoreResult<Vec<Violation>>
    where
        T: ToValue + ?Sized,
        U: ToValue + ?Sized,
    {
        self.run_var(&value.to_value(), Some(&other.to_value()), expr)
    }

    fn run_var(&self, value: &Value, other: Option<&Value>, expr: &str) -> CoreResult<Vec<Violation>> {
        let set = self.registry.compile(expr)?;
        let mut walker = self.walker();
        let scope = Scope {
            other,
            ..Scope::ROOT
        };
        walker.apply(&set, value, scope, "");
        Ok(walker.finish())
    }

    fn walker(&self) -> Walker<'_> {
        Walker::new(&self.registry, &self.schemas, self.config)
    }
}
