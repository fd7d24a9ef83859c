//! Declared field rules per record type.

use serde::{Deserialize, Serialize};

use super::registry::Registry;
use super::rules::Ruleset;
use crate::error::CoreResult;

/// One field descriptor: a field name and its rule expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(default)]
    pub rules: String,
}

/// The field descriptors of one record type, in declaration order.
///
/// ```
/// use vetter_core::RecordSchema;
///
/// let schema = RecordSchema::new("LoginRequest")
///     .field("Username", "required,email")
///     .field("Password", "required,min=5");
/// assert_eq!(schema.fields().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    #[serde(rename = "name")]
    type_tag: String,
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

impl RecordSchema {
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, rules: impl Into<String>) -> Self {
        self.fields.push(FieldSchema {
            name: name.into(),
            rules: rules.into(),
        });
        self
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub(crate) fn compile(&self, registry: &Registry) -> CoreResult<CompiledSchema> {
        let fields = self
            .fields
            .iter()
            .map(|f| registry.compile(&f.rules).map(|set| (f.name.clone(), set)))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(CompiledSchema { fields })
    }
}

/// A schema whose rule expressions have been parsed and resolved.
#[derive(Debug, Clone)]
pub(crate) struct CompiledSchema {
    pub(crate) fields: Vec<(String, Ruleset)>,
}

impl CompiledSchema {
    pub(crate) fn declares(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use assert_matches::assert_matches;

    #[test]
    fn compiles_in_declaration_order() {
        let schema = RecordSchema::new("User")
            .field("Id", "required")
            .field("Hobbies", "required,dive,required,min=3");
        let compiled = schema.compile(&Registry::new()).unwrap();
        let names: Vec<&str> = compiled.fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Id", "Hobbies"]);
        assert!(compiled.fields[1].1.dive.is_some());
        assert!(compiled.declares("Hobbies"));
        assert!(!compiled.declares("Name"));
    }

    #[test]
    fn compile_surfaces_unknown_rule() {
        let schema = RecordSchema::new("LoginRequest").field("Username", "required,weswes");
        assert_matches!(
            schema.compile(&Registry::new()),
            Err(CoreError::UnknownRule { rule, .. }) if rule == "weswes"
        );
    }

    #[test]
    fn deserializes_from_json() {
        let schema: RecordSchema = serde_json::from_str(
            r#"{"name": "School", "fields": [{"name": "Name", "rules": "required"}]}"#,
        )
        .unwrap();
        assert_eq!(schema, RecordSchema::new("School").field("Name", "required"));
    }
}
