//! Discovery types
//!
//! Field metadata of data extensions and the rules that turn it into a
//! stream schema.

use crate::schema::SchemaProperty;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Namespace prefixed to every data extension stream id
pub const DATA_EXTENSION_PREFIX: &str = "data_extension.";

/// Synthetic primary key every data extension row carries
pub const CUSTOM_OBJECT_KEY: &str = "_CustomObjectKey";

/// Parent-derived field attached to every data extension row
pub const CATEGORY_FIELD: &str = "CategoryID";

/// Replication key candidates, highest priority first
pub const REPLICATION_KEY_PRIORITY: [&str; 4] =
    ["ModifiedDate", "JoinDate", "_ModifiedDate", "_CreatedDate"];

static NON_ALPHANUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9_]").unwrap());

/// One field of a data extension as reported by the metadata query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredField {
    /// Customer key of the owning data extension
    pub customer_key: String,
    /// Field name
    pub name: String,
    /// Remote field type (`Text`, `Number`, `Date`, `Boolean`, `Decimal`, ...)
    pub field_type: String,
    /// Part of the primary key
    pub is_primary_key: bool,
}

impl DiscoveredField {
    /// Schema for the field's remote type; replication candidates are
    /// always date-times so they can be bookmarked
    pub fn schema(&self) -> SchemaProperty {
        if self.is_replication_candidate() {
            SchemaProperty::date_time()
        } else {
            field_type_schema(&self.field_type)
        }
    }

    /// Whether the field may serve as replication key; decided by name alone
    pub fn is_replication_candidate(&self) -> bool {
        REPLICATION_KEY_PRIORITY.contains(&self.name.as_str())
    }
}

/// Grouped fields of one data extension
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    /// Primary key fields, in discovery order
    pub key_properties: Vec<String>,
    /// Fields eligible as replication key
    pub valid_replication_keys: Vec<String>,
    /// Field schemas by name
    pub properties: BTreeMap<String, SchemaProperty>,
}

impl FieldSet {
    /// Fold one discovered field in
    pub fn add(&mut self, field: &DiscoveredField) {
        if field.is_primary_key && !self.key_properties.contains(&field.name) {
            self.key_properties.push(field.name.clone());
        }
        if field.is_replication_candidate() && !self.valid_replication_keys.contains(&field.name) {
            self.valid_replication_keys.push(field.name.clone());
        }
        self.properties.insert(field.name.clone(), field.schema());
    }

    /// The replication key to use, by fixed priority
    pub fn replication_key(&self) -> Option<&'static str> {
        choose_replication_key(&self.valid_replication_keys)
    }
}

/// Map a remote field type to a schema.
///
/// Unknown types (`Text`, `EmailAddress`, `Phone`, `Locale`, ...) are strings.
pub fn field_type_schema(field_type: &str) -> SchemaProperty {
    match field_type.to_ascii_lowercase().as_str() {
        "boolean" => SchemaProperty::boolean(),
        "decimal" => SchemaProperty::decimal(),
        "number" => SchemaProperty::integer(),
        "date" => SchemaProperty::date_time(),
        _ => SchemaProperty::string(),
    }
}

/// Pick the highest-priority candidate, independent of discovery order
pub fn choose_replication_key<S: AsRef<str>>(candidates: &[S]) -> Option<&'static str> {
    REPLICATION_KEY_PRIORITY
        .iter()
        .find(|key| candidates.iter().any(|c| c.as_ref() == **key))
        .copied()
}

/// Stream id for a data extension name: lower-cased, alphanumeric only
pub fn data_extension_stream_id(name: &str) -> String {
    let lowered = name.trim().to_lowercase().replace([' ', '-'], "_");
    format!(
        "{DATA_EXTENSION_PREFIX}{}",
        NON_ALPHANUMERIC.replace_all(&lowered, "")
    )
}
