//! Data extension discovery
//!
//! Two passes over the metadata API: every `DataExtensionField`, grouped by
//! owning data extension, then every `DataExtension`, each turned into a
//! stream descriptor.

use super::types::{
    data_extension_stream_id, DiscoveredField, FieldSet, CATEGORY_FIELD, CUSTOM_OBJECT_KEY,
};
use crate::error::Result;
use crate::pagination::{RecordCursor, RetrieveCursor};
use crate::schema::{JsonSchema, SchemaProperty};
use crate::soap::RetrieveRequest;
use crate::streams::{ReplicationStrategy, Source, StreamDescriptor};
use crate::transform::{coerce_boolean, FieldRule};
use crate::transport::Transport;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

const FIELD_PROPERTIES: [&str; 4] = ["Name", "FieldType", "IsPrimaryKey", "DataExtension.CustomerKey"];
const EXTENSION_PROPERTIES: [&str; 3] = ["CustomerKey", "Name", "CategoryID"];

/// Discovers data extensions through a transport
pub struct DataExtensionDiscovery<'a> {
    transport: &'a dyn Transport,
    batch_size: u32,
}

impl<'a> DataExtensionDiscovery<'a> {
    /// Create a discovery pass
    pub fn new(transport: &'a dyn Transport, batch_size: u32) -> Self {
        Self {
            transport,
            batch_size,
        }
    }

    /// Run both passes and synthesize one descriptor per data extension.
    ///
    /// Any remote error fails the whole pass.
    pub async fn discover(&self) -> Result<Vec<StreamDescriptor>> {
        let fields = self.field_sets().await?;
        let extensions = self.fetch_all("DataExtension", &EXTENSION_PROPERTIES).await?;

        let mut seen = HashSet::new();
        let mut descriptors = Vec::with_capacity(extensions.len());
        for extension in &extensions {
            let Some(customer_key) = text(extension, "CustomerKey") else {
                warn!("Skipping data extension without a customer key");
                continue;
            };
            let name = text(extension, "Name").unwrap_or(customer_key);
            let field_set = fields.get(customer_key).cloned().unwrap_or_default();

            let mut descriptor = synthesize(customer_key, name, category_id(extension), field_set);
            if !seen.insert(descriptor.name.clone()) {
                let fallback = data_extension_stream_id(&format!("{name}_{customer_key}"));
                warn!(
                    stream = %descriptor.name,
                    fallback = %fallback,
                    "Data extension name collides with another, using its customer key"
                );
                descriptor.name = fallback;
                seen.insert(descriptor.name.clone());
            }
            debug!(
                stream = %descriptor.name,
                method = %descriptor.replication_method(),
                fields = descriptor.schema.properties.len(),
                "Discovered data extension"
            );
            descriptors.push(descriptor);
        }

        info!(count = descriptors.len(), "Discovered data extensions");
        Ok(descriptors)
    }

    /// First pass: fields grouped by customer key
    async fn field_sets(&self) -> Result<HashMap<String, FieldSet>> {
        let mut sets: HashMap<String, FieldSet> = HashMap::new();
        for raw in self.fetch_all("DataExtensionField", &FIELD_PROPERTIES).await? {
            match parse_field(&raw) {
                Some(field) => sets.entry(field.customer_key.clone()).or_default().add(&field),
                None => warn!(field = %raw, "Skipping data extension field without name or owner"),
            }
        }
        Ok(sets)
    }

    async fn fetch_all(&self, object_type: &str, properties: &[&str]) -> Result<Vec<Value>> {
        let request = RetrieveRequest::new(
            object_type,
            properties.iter().map(ToString::to_string).collect(),
        )
        .with_batch_size(self.batch_size);

        let mut cursor = RetrieveCursor::new(self.transport, request);
        let mut records = Vec::new();
        while let Some(page) = cursor.next_page().await? {
            records.extend(page);
        }
        Ok(records)
    }
}

fn text<'v>(record: &'v Value, field: &str) -> Option<&'v str> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_field(raw: &Value) -> Option<DiscoveredField> {
    let customer_key = raw
        .get("DataExtension")
        .and_then(|de| text(de, "CustomerKey"))?;
    Some(DiscoveredField {
        customer_key: customer_key.to_string(),
        name: text(raw, "Name")?.to_string(),
        field_type: text(raw, "FieldType").unwrap_or("Text").to_string(),
        is_primary_key: raw
            .get("IsPrimaryKey")
            .and_then(coerce_boolean)
            .unwrap_or(false),
    })
}

fn category_id(extension: &Value) -> Value {
    text(extension, "CategoryID")
        .and_then(|s| s.parse::<i64>().ok())
        .map_or(Value::Null, Value::from)
}

/// Build the descriptor of one data extension
pub fn synthesize(
    customer_key: &str,
    name: &str,
    category_id: Value,
    fields: FieldSet,
) -> StreamDescriptor {
    let key_properties: Vec<String> = std::iter::once(CUSTOM_OBJECT_KEY.to_string())
        .chain(fields.key_properties.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut schema = JsonSchema::new()
        .with(CUSTOM_OBJECT_KEY, SchemaProperty::string())
        .with(CATEGORY_FIELD, SchemaProperty::integer());
    for (field, property) in &fields.properties {
        schema.add_property(field, property.clone());
    }

    let replication = fields
        .replication_key()
        .map_or(ReplicationStrategy::FullTable, ReplicationStrategy::incremental);

    StreamDescriptor {
        name: data_extension_stream_id(name),
        source: Source::DataExtension {
            customer_key: customer_key.to_string(),
        },
        key_properties,
        valid_replication_keys: fields.valid_replication_keys,
        replication,
        schema,
        rules: vec![
            FieldRule::PropertyBag,
            FieldRule::constant(CATEGORY_FIELD, category_id),
        ],
    }
}

impl std::fmt::Debug for DataExtensionDiscovery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataExtensionDiscovery")
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}
