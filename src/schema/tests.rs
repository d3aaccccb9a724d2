//! Schema tests

use super::*;
use crate::error::Error;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;

fn email_schema() -> JsonSchema {
    JsonSchema::new()
        .with("ID", SchemaProperty::integer())
        .with("Name", SchemaProperty::string())
        .with("IsHTMLPaste", SchemaProperty::boolean())
        .with("ModifiedDate", SchemaProperty::date_time())
        .with("Score", SchemaProperty::decimal())
}

fn record(value: serde_json::Value) -> crate::types::JsonObject {
    value.as_object().cloned().unwrap()
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_property_serializes_nullable_type() {
    assert_eq!(
        serde_json::to_value(SchemaProperty::date_time()).unwrap(),
        json!({"type": ["null", "string"], "format": "date-time"})
    );
    assert_eq!(
        serde_json::to_value(SchemaProperty::integer()).unwrap(),
        json!({"type": ["null", "integer"]})
    );
}

#[test]
fn test_schema_to_json() {
    let schema = JsonSchema::new().with("ID", SchemaProperty::string());
    assert_eq!(
        schema.to_json(),
        json!({
            "type": "object",
            "properties": {"ID": {"type": ["null", "string"]}},
            "additionalProperties": false
        })
    );

    let parsed: JsonSchema = serde_json::from_value(schema.to_json()).unwrap();
    assert_eq!(parsed, schema);
}

#[test]
fn test_type_helpers() {
    let prop = SchemaProperty::decimal();
    assert_eq!(prop.primary_type(), Some(JsonType::Number));
    assert!(prop.is_nullable());
    assert!(!prop.is_date_time());
    assert_eq!(JsonTypeOrArray::Single(JsonType::Null).primary_type(), None);
    assert_eq!(JsonType::Integer.to_string(), "integer");
}

#[test]
fn test_select_restricts_properties() {
    let selected = email_schema().select(&["ID", "ModifiedDate", "Missing"]);
    let names: Vec<&str> = selected.field_names().collect();
    assert_eq!(names, vec!["ID", "ModifiedDate"]);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_validate_accepts_conforming_record() {
    let schema = email_schema();
    let ok = record(json!({
        "ID": 12,
        "Name": "Welcome",
        "IsHTMLPaste": false,
        "ModifiedDate": "2017-11-01T00:00:00Z",
        "Score": 1.5
    }));
    assert!(schema.validate(&ok).is_ok());

    let sparse = record(json!({"ID": 1, "Name": null}));
    assert!(schema.validate(&sparse).is_ok());
}

#[test]
fn test_validate_rejects_wrong_type() {
    let err = email_schema()
        .validate(&record(json!({"ID": "twelve"})))
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { ref field, .. } if field == "ID"));
}

#[test]
fn test_validate_rejects_bad_timestamp() {
    let err = email_schema()
        .validate(&record(json!({"ModifiedDate": "yesterday"})))
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { ref field, .. } if field == "ModifiedDate"));
}

#[test]
fn test_validate_unknown_fields() {
    let strict = email_schema();
    assert!(strict.validate(&record(json!({"Extra": 1}))).is_err());

    let mut open = email_schema();
    open.additional_properties = true;
    assert!(open.validate(&record(json!({"Extra": 1}))).is_ok());
}

#[test]
fn test_validate_nested_object() {
    let mut nested = BTreeMap::new();
    nested.insert("ID".to_string(), SchemaProperty::integer());
    let schema = JsonSchema::new().with("Email", SchemaProperty::object(nested));

    assert!(schema.validate(&record(json!({"Email": {"ID": 4}}))).is_ok());
    let err = schema
        .validate(&record(json!({"Email": {"ID": "x"}})))
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { ref field, .. } if field == "Email.ID"));
}

#[test]
fn test_validate_array_items() {
    let schema = JsonSchema::new().with("Tags", SchemaProperty::array(SchemaProperty::string()));
    assert!(schema.validate(&record(json!({"Tags": ["a", "b"]}))).is_ok());
    assert!(schema.validate(&record(json!({"Tags": ["a", 2]}))).is_err());
}
