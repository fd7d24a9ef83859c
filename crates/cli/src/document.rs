//! JSON document to [`Value`] conversion guided by the schema file.
//!
//! An object becomes a [`Record`] only when its record type is known, from
//! the root type or from the `type` of the field holding it. Everything else
//! falls back to the untyped conversion, where objects are string-keyed maps.

use serde_json::Value as Json;
use vetter_core::{Record, Value};

use crate::schema_file::{FieldDef, SchemaFile};

#[derive(Debug, Clone, Copy)]
enum Hint<'a> {
    None,
    Record(&'a str),
    /// Object whose values are of the given record type, if any.
    MapOf(Option<&'a str>),
}

impl<'a> Hint<'a> {
    fn for_field(field: &'a FieldDef) -> Self {
        match (field.map, field.type_name.as_deref()) {
            (true, type_name) => Hint::MapOf(type_name),
            (false, Some(type_name)) => Hint::Record(type_name),
            (false, None) => Hint::None,
        }
    }

    fn from_type(type_name: Option<&'a str>) -> Self {
        type_name.map_or(Hint::None, Hint::Record)
    }
}

/// Convert `json` treating its top level as a record of type `root`.
pub fn to_value(schema: &SchemaFile, json: &Json, root: &str) -> Value {
    convert(schema, json, Hint::Record(root))
}

fn convert(schema: &SchemaFile, json: &Json, hint: Hint<'_>) -> Value {
    match (json, hint) {
        (Json::Object(obj), Hint::Record(type_name)) => {
            let def = schema.type_def(type_name);
            let record = obj.iter().fold(Record::new(type_name), |record, (key, item)| {
                let field_hint = def
                    .and_then(|d| d.field(key))
                    .map_or(Hint::None, Hint::for_field);
                record.field(key.as_str(), convert(schema, item, field_hint))
            });
            Value::Record(record)
        }
        (Json::Object(obj), Hint::MapOf(type_name)) => Value::Map(
            obj.iter()
                .map(|(key, item)| {
                    let item = convert(schema, item, Hint::from_type(type_name));
                    (Value::from(key.as_str()), item)
                })
                .collect(),
        ),
        (Json::Array(items), hint) => {
            Value::Seq(items.iter().map(|item| convert(schema, item, hint)).collect())
        }
        (other, _) => Value::from(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> SchemaFile {
        SchemaFile::from_json(
            r#"{
                "types": [
                    { "name": "User", "fields": [
                        { "name": "Id", "rules": "required" },
                        { "name": "Address", "rules": "required", "type": "Address" },
                        { "name": "Addresses", "rules": "dive", "type": "Address" },
                        { "name": "Schools", "rules": "dive", "type": "School", "map": true },
                        { "name": "Wallet", "rules": "dive", "map": true }
                    ] },
                    { "name": "Address", "fields": [{ "name": "City", "rules": "required" }] },
                    { "name": "School", "fields": [{ "name": "Name", "rules": "required" }] }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn root_and_typed_fields_become_records() {
        let doc = json!({
            "Id": "1",
            "Address": { "City": "Jakarta" },
            "Addresses": [{ "City": "" }],
            "Extra": { "k": 1 }
        });
        let value = to_value(&schema(), &doc, "User");
        let user = value.as_record().unwrap();
        assert_eq!(user.type_tag(), "User");
        assert_eq!(user.get("Address").unwrap().as_record().unwrap().type_tag(), "Address");
        match user.get("Addresses").unwrap() {
            Value::Seq(items) => assert_eq!(items[0].as_record().unwrap().type_tag(), "Address"),
            other => panic!("expected a sequence, got {other:?}"),
        }
        assert!(matches!(user.get("Extra"), Some(Value::Map(_))));
    }

    #[test]
    fn map_fields_type_their_values() {
        let doc = json!({
            "Schools": { "SD": { "Name": "SD Indonesia" } },
            "Wallet": { "BCA": 1000000, "Rate": 1.5 }
        });
        let value = to_value(&schema(), &doc, "User");
        let user = value.as_record().unwrap();

        let Some(Value::Map(schools)) = user.get("Schools") else {
            panic!("Schools should be a map");
        };
        assert_eq!(schools[0].0, Value::from("SD"));
        assert_eq!(schools[0].1.as_record().unwrap().type_tag(), "School");

        let Some(Value::Map(wallet)) = user.get("Wallet") else {
            panic!("Wallet should be a map");
        };
        assert!(wallet.contains(&(Value::from("BCA"), Value::Int(1_000_000))));
        assert!(wallet.contains(&(Value::from("Rate"), Value::Float(1.5))));
    }
}
