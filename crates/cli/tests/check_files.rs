use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vetter_cli::check_files;
use vetter_core::ValidatorConfig;

const SCHEMA: &str = r#"{
    "aliases": { "varchar": "required,max=255" },
    "types": [
        { "name": "User", "fields": [
            { "name": "Id", "rules": "varchar" },
            { "name": "Name", "rules": "varchar" },
            { "name": "Address", "rules": "required", "type": "Address" },
            { "name": "Hobbies", "rules": "required,dive,required,min=3" },
            { "name": "Schools", "rules": "dive,keys,required,min=2,endkeys,dive", "type": "School", "map": true },
            { "name": "Wallet", "rules": "dive,keys,required,endkeys,required,gt=1000", "map": true }
        ] },
        { "name": "Address", "fields": [
            { "name": "City", "rules": "required" },
            { "name": "Country", "rules": "required" }
        ] },
        { "name": "School", "fields": [{ "name": "Name", "rules": "required" }] }
    ],
    "root": "User"
}"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn sorted(mut pairs: Vec<(String, String)>) -> Vec<(String, String)> {
    pairs.sort();
    pairs
}

// ---------------------------------------------------------------------------
// Test: valid document
// ---------------------------------------------------------------------------

#[test]
fn valid_document_has_no_violations() {
    let dir = TempDir::new().unwrap();
    let schema = write(dir.path(), "schema.json", SCHEMA);
    let input = write(
        dir.path(),
        "user.json",
        r#"{
            "Id": "1", "Name": "Eko",
            "Address": { "City": "Jakarta", "Country": "Indonesia" },
            "Hobbies": ["Gaming"],
            "Schools": { "SD": { "Name": "SD Indonesia" } },
            "Wallet": { "BCA": 1000000 }
        }"#,
    );

    let violations = check_files(&schema, &input, None, ValidatorConfig::default()).unwrap();
    assert!(violations.is_empty(), "unexpected: {violations:?}");
}

// ---------------------------------------------------------------------------
// Test: invalid document
// ---------------------------------------------------------------------------

#[test]
fn invalid_document_reports_paths() {
    let dir = TempDir::new().unwrap();
    let schema = write(dir.path(), "schema.json", SCHEMA);
    let input = write(
        dir.path(),
        "user.json",
        r#"{
            "Id": "", "Name": "Eko",
            "Address": { "City": "Jakarta", "Country": "" },
            "Hobbies": ["Gaming", "Coding", "", "X"],
            "Schools": { "SD": { "Name": "SD Indonesia" }, "SMP": { "Name": "" }, "": { "Name": "" } },
            "Wallet": { "BCA": 1000000, "MANDIRI": 0, "": 1001 }
        }"#,
    );

    let violations = check_files(&schema, &input, None, ValidatorConfig::default()).unwrap();
    let pairs = sorted(
        violations
            .iter()
            .map(|v| (v.path.clone(), v.rule.clone()))
            .collect(),
    );
    let expected = sorted(
        [
            ("Id", "required"),
            ("Address.Country", "required"),
            ("Hobbies[2]", "required"),
            ("Hobbies[3]", "min"),
            ("Schools{}", "required"),
            ("Schools[SMP].Name", "required"),
            ("Schools[].Name", "required"),
            ("Wallet{}", "required"),
            ("Wallet[MANDIRI]", "required"),
        ]
        .map(|(p, r)| (p.to_string(), r.to_string()))
        .to_vec(),
    );
    assert_eq!(pairs, expected);
}

// ---------------------------------------------------------------------------
// Test: configuration errors
// ---------------------------------------------------------------------------

#[test]
fn root_flag_overrides_schema_root() {
    let dir = TempDir::new().unwrap();
    let schema = write(dir.path(), "schema.json", SCHEMA);
    let input = write(dir.path(), "address.json", r#"{ "City": "", "Country": "ID" }"#);

    let violations =
        check_files(&schema, &input, Some("Address"), ValidatorConfig::default()).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].path, "City");
}

#[test]
fn undeclared_root_is_an_error() {
    let dir = TempDir::new().unwrap();
    let schema = write(dir.path(), "schema.json", SCHEMA);
    let input = write(dir.path(), "doc.json", "{}");

    let err = check_files(&schema, &input, Some("Seller"), ValidatorConfig::default())
        .unwrap_err();
    assert!(err.to_string().contains("Seller"));
}

#[test]
fn unknown_rule_is_an_error() {
    let dir = TempDir::new().unwrap();
    let schema = write(
        dir.path(),
        "schema.json",
        r#"{ "types": [{ "name": "T", "fields": [{ "name": "A", "rules": "weswes" }] }], "root": "T" }"#,
    );
    let input = write(dir.path(), "doc.json", r#"{ "A": "x" }"#);

    let err = check_files(&schema, &input, None, ValidatorConfig::default()).unwrap_err();
    assert!(format!("{err:#}").contains("weswes"));
}

#[test]
fn missing_input_is_an_error() {
    let dir = TempDir::new().unwrap();
    let schema = write(dir.path(), "schema.json", SCHEMA);
    let missing = dir.path().join("nope.json");

    assert!(check_files(&schema, &missing, None, ValidatorConfig::default()).is_err());
}
