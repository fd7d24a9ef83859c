//! The JSON schema file read by `vetter`.
//!
//! ```json
//! {
//!   "aliases": { "varchar": "required,max=255" },
//!   "types": [
//!     { "name": "User", "fields": [
//!         { "name": "Id", "rules": "varchar" },
//!         { "name": "Address", "rules": "required", "type": "Address" },
//!         { "name": "Schools", "rules": "dive,keys,required,endkeys", "type": "School", "map": true }
//!     ] }
//!   ],
//!   "root": "User"
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use vetter_core::{CoreResult, RecordSchema, Validator, ValidatorConfig};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    /// Record type of the input document when `--root` is not given.
    #[serde(default)]
    pub root: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub rules: String,
    /// Record type of the field's object value, or of each element/map value.
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    /// Treat the field's object as a map instead of a record.
    #[serde(default)]
    pub map: bool,
}

impl SchemaFile {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid schema file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Register every alias and type, then freeze the validator.
    pub fn build_validator(&self, config: ValidatorConfig) -> CoreResult<Validator> {
        let mut builder = Validator::builder().config(config);
        for (name, expansion) in &self.aliases {
            builder.register_alias(name.as_str(), expansion.as_str())?;
        }
        for def in &self.types {
            builder.register_schema(def.to_record_schema())?;
        }
        builder.build()
    }
}

impl TypeDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn to_record_schema(&self) -> RecordSchema {
        self.fields
            .iter()
            .fold(RecordSchema::new(self.name.as_str()), |schema, f| {
                schema.field(f.name.as_str(), f.rules.as_str())
            })
    }
}
