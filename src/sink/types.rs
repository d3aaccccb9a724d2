//! Sink message types
//!
//! The three messages a sync emits, serialized one per line:
//!
//! ```json
//! {"type": "SCHEMA", "stream": "emails", "schema": {...}, "key_properties": ["ID"], "bookmark_properties": ["ModifiedDate"]}
//! {"type": "RECORD", "stream": "emails", "record": {...}, "time_extracted": "2019-01-01T00:00:00Z"}
//! {"type": "STATE", "value": {"bookmarks": {...}, "currently_syncing": null}}
//! ```

use crate::schema::JsonSchema;
use crate::types::JsonObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message emitted during sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Schema of a stream, sent before its first record
    Schema {
        /// Stream id
        stream: String,
        /// Schema of the selected fields
        schema: JsonSchema,
        /// Fields forming the record identity
        key_properties: Vec<String>,
        /// Replication key, for incremental streams
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// One canonical record
    Record {
        /// Stream id
        stream: String,
        /// The record
        record: JsonObject,
        /// When the record was extracted
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_extracted: Option<DateTime<Utc>>,
    },
    /// Checkpoint of the sync state
    State {
        /// Serialized `SyncState`
        value: Value,
    },
}

impl Message {
    /// Create a record message stamped with the current time
    pub fn record(stream: impl Into<String>, record: JsonObject) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: Some(Utc::now()),
        }
    }

    /// Create a state message
    pub fn state(value: Value) -> Self {
        Self::State { value }
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Stream the message belongs to (state messages belong to none)
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }
}
