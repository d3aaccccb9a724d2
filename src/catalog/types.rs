//! Configured catalog types
//!
//! The catalog `discover` prints and `sync` reads back after the user has
//! marked streams and fields as selected:
//!
//! ```json
//! {"streams": [{
//!   "tap_stream_id": "emails",
//!   "stream": "emails",
//!   "key_properties": ["ID"],
//!   "replication_key": "ModifiedDate",
//!   "replication_method": "INCREMENTAL",
//!   "schema": {...},
//!   "metadata": [
//!     {"breadcrumb": [], "metadata": {"selected": true, "table-key-properties": ["ID"]}},
//!     {"breadcrumb": ["properties", "ID"], "metadata": {"inclusion": "automatic"}}
//!   ]
//! }]}
//! ```

use crate::discovery::StreamCatalog;
use crate::error::{Error, Result};
use crate::schema::JsonSchema;
use crate::streams::StreamDescriptor;
use crate::types::{Inclusion, ReplicationMethod};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata attached to a stream (empty breadcrumb) or a field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    /// User selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,

    /// Whether a field can be deselected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusion: Option<Inclusion>,

    /// Selection applied when the user made none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_by_default: Option<bool>,

    /// Stream keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_key_properties: Option<Vec<String>>,

    /// Candidate replication keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_replication_keys: Option<Vec<String>>,

    /// Replication method the stream always uses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_replication_method: Option<ReplicationMethod>,
}

/// Metadata for one breadcrumb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// `[]` for the stream, `["properties", field]` for a field
    pub breadcrumb: Vec<String>,
    /// The metadata
    pub metadata: Metadata,
}

impl MetadataEntry {
    /// Stream-level entry
    pub fn stream(metadata: Metadata) -> Self {
        Self {
            breadcrumb: Vec::new(),
            metadata,
        }
    }

    /// Field-level entry
    pub fn field(name: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            breadcrumb: vec!["properties".to_string(), name.into()],
            metadata,
        }
    }

    /// Field name, for field-level entries
    pub fn field_name(&self) -> Option<&str> {
        match self.breadcrumb.as_slice() {
            [properties, name] if properties == "properties" => Some(name.as_str()),
            _ => None,
        }
    }
}

/// One stream of the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream id
    pub tap_stream_id: String,
    /// Stream name
    pub stream: String,
    /// Record identity fields
    #[serde(default)]
    pub key_properties: Vec<String>,
    /// Replication key, for incremental streams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,
    /// Replication method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_method: Option<ReplicationMethod>,
    /// Full stream schema
    pub schema: JsonSchema,
    /// Selection metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl CatalogEntry {
    /// Describe a stream, nothing selected yet
    pub fn from_descriptor(descriptor: &StreamDescriptor) -> Self {
        let automatic = descriptor.automatic_fields();
        let mut metadata = vec![MetadataEntry::stream(Metadata {
            inclusion: Some(Inclusion::Available),
            table_key_properties: Some(descriptor.key_properties.clone()),
            valid_replication_keys: Some(descriptor.valid_replication_keys.clone()),
            forced_replication_method: Some(descriptor.replication_method()),
            ..Metadata::default()
        })];

        for field in descriptor.schema.field_names() {
            let field_metadata = if automatic.iter().any(|a| a == field) {
                Metadata {
                    inclusion: Some(Inclusion::Automatic),
                    ..Metadata::default()
                }
            } else {
                Metadata {
                    inclusion: Some(Inclusion::Available),
                    selected_by_default: Some(true),
                    ..Metadata::default()
                }
            };
            metadata.push(MetadataEntry::field(field, field_metadata));
        }

        Self {
            tap_stream_id: descriptor.name.clone(),
            stream: descriptor.name.clone(),
            key_properties: descriptor.key_properties.clone(),
            replication_key: descriptor.replication_key().map(ToString::to_string),
            replication_method: Some(descriptor.replication_method()),
            schema: descriptor.schema.clone(),
            metadata,
        }
    }

    /// Stream-level metadata
    pub fn stream_metadata(&self) -> Option<&Metadata> {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.is_empty())
            .map(|m| &m.metadata)
    }

    /// Metadata of one field
    pub fn field_metadata(&self, field: &str) -> Option<&Metadata> {
        self.metadata
            .iter()
            .find(|m| m.field_name() == Some(field))
            .map(|m| &m.metadata)
    }

    /// Whether the user selected this stream
    pub fn is_selected(&self) -> bool {
        self.stream_metadata()
            .and_then(|m| m.selected)
            .unwrap_or(false)
    }

    /// Mark the stream selected
    #[must_use]
    pub fn selected(mut self) -> Self {
        match self.metadata.iter_mut().find(|m| m.breadcrumb.is_empty()) {
            Some(entry) => entry.metadata.selected = Some(true),
            None => self.metadata.push(MetadataEntry::stream(Metadata {
                selected: Some(true),
                ..Metadata::default()
            })),
        }
        self
    }

    /// Fields to replicate: automatic, explicitly selected, and
    /// selected-by-default fields the user left alone.
    ///
    /// Fields marked unsupported or deselected are left out.
    pub fn selected_fields(&self) -> Vec<String> {
        self.metadata
            .iter()
            .filter_map(|entry| {
                let name = entry.field_name()?;
                let m = &entry.metadata;
                let include = match m.inclusion {
                    Some(Inclusion::Automatic) => true,
                    Some(Inclusion::Unsupported) => false,
                    _ => m.selected.unwrap_or(m.selected_by_default.unwrap_or(false)),
                };
                include.then(|| name.to_string())
            })
            .collect()
    }
}

/// The catalog `sync` reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredCatalog {
    /// Catalog streams
    pub streams: Vec<CatalogEntry>,
}

impl ConfiguredCatalog {
    /// Describe every stream of a stream catalog
    pub fn from_streams(catalog: &StreamCatalog) -> Self {
        Self {
            streams: catalog
                .streams()
                .iter()
                .map(CatalogEntry::from_descriptor)
                .collect(),
        }
    }

    /// Describe every stream with everything selected
    pub fn select_all(catalog: &StreamCatalog) -> Self {
        Self {
            streams: catalog
                .streams()
                .iter()
                .map(|d| CatalogEntry::from_descriptor(d).selected())
                .collect(),
        }
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::catalog(format!("Failed to parse catalog JSON: {e}")))
    }

    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::catalog(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Look a stream up
    pub fn get(&self, stream: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|s| s.tap_stream_id == stream)
    }

    /// Selected streams, in catalog order
    pub fn selected_streams(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.streams.iter().filter(|s| s.is_selected())
    }

    /// Whether any selected stream is a data extension
    pub fn needs_discovery(&self) -> bool {
        self.selected_streams()
            .any(|s| crate::discovery::is_data_extension(&s.tap_stream_id))
    }
}
