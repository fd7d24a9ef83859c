//! Library side of the `vetter` binary: schema files, typed document
//! conversion and the end-to-end check used by `main`.

pub mod config;
pub mod document;
pub mod schema_file;

use std::path::Path;

use anyhow::{bail, Context};
use vetter_core::{ValidatorConfig, Violation};

use schema_file::SchemaFile;

/// Validate the JSON document at `input` against the schema file at `schema`.
///
/// `root` overrides the schema file's `root` type. Configuration and I/O
/// problems are errors; data problems are returned as violations.
pub fn check_files(
    schema: &Path,
    input: &Path,
    root: Option<&str>,
    config: ValidatorConfig,
) -> anyhow::Result<Vec<Violation>> {
    let schema_file = SchemaFile::from_path(schema)?;

    let Some(root) = root.or(schema_file.root.as_deref()) else {
        bail!("No root type: pass --root or set \"root\" in the schema file");
    };
    if schema_file.type_def(root).is_none() {
        bail!("Root type '{root}' is not declared in {}", schema.display());
    }

    let validator = schema_file
        .build_validator(config)
        .with_context(|| format!("Invalid rules in {}", schema.display()))?;
    tracing::info!(
        schema = %schema.display(),
        types = schema_file.types.len(),
        aliases = schema_file.aliases.len(),
        "Loaded schema"
    );

    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input {}", input.display()))?;
    let json: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Input {} is not valid JSON", input.display()))?;
    if !json.is_object() {
        bail!("Input {} must be a JSON object", input.display());
    }

    let value = document::to_value(&schema_file, &json, root);
    let violations = validator.validate(&value);
    tracing::info!(root, violations = violations.len(), "Validated document");
    Ok(violations)
}
