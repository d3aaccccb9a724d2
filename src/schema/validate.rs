//! Record validation
//!
//! Checks a transformed record against its stream schema. A failure is a
//! schema mismatch: the record is skipped and counted, never fatal.

use super::types::{JsonSchema, JsonType, SchemaProperty};
use crate::error::{Error, Result};
use crate::types::{parse_datetime, JsonObject};
use serde_json::Value;

impl JsonSchema {
    /// Validate a record.
    ///
    /// Fields missing from the record are fine (every property is
    /// nullable). Unknown fields fail unless `additionalProperties` is set.
    pub fn validate(&self, record: &JsonObject) -> Result<()> {
        for (name, value) in record {
            match self.properties.get(name) {
                Some(property) => validate_value(name, property, value)?,
                None if self.additional_properties => {}
                None => {
                    return Err(Error::schema_mismatch(name, "field is not in the schema"));
                }
            }
        }
        Ok(())
    }
}

fn validate_value(path: &str, property: &SchemaProperty, value: &Value) -> Result<()> {
    if value.is_null() {
        return if property.is_nullable() {
            Ok(())
        } else {
            Err(Error::schema_mismatch(path, "null for a non-nullable field"))
        };
    }

    let Some(expected) = property.primary_type() else {
        return Err(Error::schema_mismatch(path, format!("expected null, got {value}")));
    };

    let type_ok = match expected {
        JsonType::String => value.is_string(),
        JsonType::Integer => value.is_i64() || value.is_u64(),
        JsonType::Number => value.is_number(),
        JsonType::Boolean => value.is_boolean(),
        JsonType::Object => value.is_object(),
        JsonType::Array => value.is_array(),
        JsonType::Null => false,
    };
    if !type_ok {
        return Err(Error::schema_mismatch(path, format!("expected {expected}, got {value}")));
    }

    if property.is_date_time() {
        let text = value.as_str().unwrap_or_default();
        if parse_datetime(text).is_none() {
            return Err(Error::schema_mismatch(path, format!("'{text}' is not a date-time")));
        }
    }

    match value {
        Value::Object(map) => {
            if let Some(nested) = &property.properties {
                for (name, inner) in map {
                    if let Some(inner_property) = nested.get(name) {
                        validate_value(&format!("{path}.{name}"), inner_property, inner)?;
                    }
                }
            }
        }
        Value::Array(items) => {
            if let Some(item_property) = &property.items {
                for (i, item) in items.iter().enumerate() {
                    validate_value(&format!("{path}[{i}]"), item_property, item)?;
                }
            }
        }
        _ => {}
    }

    Ok(())
}
