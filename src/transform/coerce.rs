//! Value coercion
//!
//! The remote service sends almost everything as text. These helpers turn
//! wire strings into the type a schema property declares.

use crate::error::{Error, Result};
use crate::schema::{JsonType, SchemaProperty};
use crate::types::normalize_datetime;
use serde_json::{Number, Value};
use tracing::warn;

const TRUTHY: [&str; 4] = ["1", "y", "yes", "true"];
const FALSY: [&str; 4] = ["0", "n", "no", "false"];

/// Interpret a wire value as a boolean.
///
/// Strings are matched case-insensitively against the truthy and falsy
/// sets. Anything else logs a warning and yields `None`.
pub fn coerce_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Null => None,
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => {
                warn!(value = %n, "Unrecognised boolean value");
                None
            }
        },
        Value::String(s) => {
            let lowered = s.trim().to_ascii_lowercase();
            if TRUTHY.contains(&lowered.as_str()) {
                Some(true)
            } else if FALSY.contains(&lowered.as_str()) {
                Some(false)
            } else {
                warn!(value = %s, "Unrecognised boolean value");
                None
            }
        }
        other => {
            warn!(value = %other, "Unrecognised boolean value");
            None
        }
    }
}

/// Parse a wire value as an integer
pub fn coerce_integer(field: &str, value: &Value) -> Result<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Value::from(f as i64)),
            _ => Err(Error::schema_mismatch(field, format!("{n} is not an integer"))),
        },
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| Error::schema_mismatch(field, format!("'{s}' is not an integer"))),
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        other => Err(Error::schema_mismatch(field, format!("{other} is not an integer"))),
    }
}

/// Parse a wire value as a number
pub fn coerce_number(field: &str, value: &Value) -> Result<Value> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| Error::schema_mismatch(field, format!("'{s}' is not a number"))),
        other => Err(Error::schema_mismatch(field, format!("{other} is not a number"))),
    }
}

/// Coerce a value to the type declared by `property`.
///
/// Empty strings become null for every non-string type.
pub fn coerce_value(field: &str, value: Value, property: &SchemaProperty) -> Result<Value> {
    if value.is_null() {
        return Ok(value);
    }
    let Some(target) = property.primary_type() else {
        return Ok(value);
    };
    if target != JsonType::String && value.as_str().is_some_and(|s| s.trim().is_empty()) {
        return Ok(Value::Null);
    }

    match target {
        JsonType::Boolean => Ok(coerce_boolean(&value).map_or(Value::Null, Value::Bool)),
        JsonType::Integer => coerce_integer(field, &value),
        JsonType::Number => coerce_number(field, &value),
        JsonType::String => Ok(match value {
            Value::String(s) if property.is_date_time() => Value::String(normalize_datetime(&s)),
            Value::String(_) => value,
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            other => other,
        }),
        JsonType::Object | JsonType::Array | JsonType::Null => Ok(value),
    }
}
