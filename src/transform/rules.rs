//! Field rules and the record transformer
//!
//! A `Transformer` reshapes a raw wire record with its rules, keeps the
//! fields the schema knows, coerces them to the declared types and
//! validates the result.

use super::coerce::coerce_value;
use crate::error::{Error, Result};
use crate::schema::JsonSchema;
use crate::types::JsonObject;
use serde_json::Value;

/// One reshaping step applied before coercion
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRule {
    /// Copy a nested value (`["List", "ID"]`) to a top-level field
    Lift { target: String, path: Vec<String> },
    /// Rename a top-level field
    Rename { from: String, to: String },
    /// Flatten a `Properties.Property[]` name/value bag into top-level fields
    PropertyBag,
    /// Attach a fixed value, typically derived from the parent object
    Constant { field: String, value: Value },
}

impl FieldRule {
    /// Lift `path` (dot separated) into `target`
    pub fn lift(target: impl Into<String>, path: &str) -> Self {
        Self::Lift {
            target: target.into(),
            path: path.split('.').map(ToString::to_string).collect(),
        }
    }

    /// Rename `from` to `to`
    pub fn rename(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Rename {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Always set `field` to `value`
    pub fn constant(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Constant {
            field: field.into(),
            value: value.into(),
        }
    }

    fn apply(&self, record: &mut JsonObject) {
        match self {
            FieldRule::Lift { target, path } => {
                let lifted = path
                    .split_first()
                    .and_then(|(head, rest)| {
                        rest.iter().try_fold(record.get(head)?, |v, key| v.get(key))
                    })
                    .cloned();
                if let Some(value) = lifted {
                    record.insert(target.clone(), value);
                }
            }
            FieldRule::Rename { from, to } => {
                if let Some(value) = record.remove(from) {
                    record.insert(to.clone(), value);
                }
            }
            FieldRule::PropertyBag => {
                if let Some(bag) = record.remove("Properties") {
                    for (name, value) in flatten_property_bag(&bag) {
                        record.insert(name, value);
                    }
                }
            }
            FieldRule::Constant { field, value } => {
                record.insert(field.clone(), value.clone());
            }
        }
    }
}

/// Turn `{"Property": [{"Name": n, "Value": v}, ...]}` into `(n, v)` pairs.
///
/// A single entry may arrive as an object instead of a one-item array.
pub fn flatten_property_bag(bag: &Value) -> Vec<(String, Value)> {
    let entries = match bag.get("Property") {
        Some(Value::Array(entries)) => entries.as_slice(),
        Some(single @ Value::Object(_)) => std::slice::from_ref(single),
        _ => return Vec::new(),
    };

    entries
        .iter()
        .filter_map(|entry| {
            let name = entry.get("Name")?.as_str()?;
            let value = entry.get("Value").cloned().unwrap_or(Value::Null);
            Some((name.to_string(), value))
        })
        .collect()
}

/// Raw record to canonical record, for one stream
#[derive(Debug, Clone)]
pub struct Transformer {
    schema: JsonSchema,
    rules: Vec<FieldRule>,
}

impl Transformer {
    /// Create a transformer for `schema`
    pub fn new(schema: JsonSchema, rules: Vec<FieldRule>) -> Self {
        Self { schema, rules }
    }

    /// The schema records are shaped into
    pub fn schema(&self) -> &JsonSchema {
        &self.schema
    }

    /// Transform one raw record.
    ///
    /// Fails with `SchemaMismatch` when the record cannot be made to fit.
    pub fn transform(&self, raw: Value) -> Result<JsonObject> {
        let Value::Object(mut record) = raw else {
            return Err(Error::schema_mismatch("$", "record is not an object"));
        };

        for rule in &self.rules {
            rule.apply(&mut record);
        }

        let mut canonical = JsonObject::new();
        for (name, value) in record {
            match self.schema.get_property(&name) {
                Some(property) => {
                    let coerced = coerce_value(&name, value, property)?;
                    canonical.insert(name, coerced);
                }
                None if self.schema.additional_properties => {
                    canonical.insert(name, value);
                }
                None => {}
            }
        }

        self.schema.validate(&canonical)?;
        Ok(canonical)
    }
}
