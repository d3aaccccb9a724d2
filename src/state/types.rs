//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs:
//!
//! ```json
//! {"bookmarks": {"emails": {"field": "ModifiedDate", "last_record": "2017-11-01T00:00:00Z"}},
//!  "currently_syncing": null}
//! ```

use crate::error::{Error, Result};
use crate::types::{normalize_datetime, parse_datetime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// High-water mark of one incremental stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Replication key the mark refers to
    pub field: String,
    /// Largest replication key value synced so far (ISO-8601)
    pub last_record: String,
}

impl Bookmark {
    /// Create a bookmark, normalising the timestamp
    pub fn new(field: impl Into<String>, last_record: &str) -> Self {
        Self {
            field: field.into(),
            last_record: normalize_datetime(last_record),
        }
    }

    /// The bookmark as a timestamp, if it parses
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_datetime(&self.last_record)
    }
}

/// Persisted sync state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, Bookmark>,

    /// Stream in flight when the state was written
    #[serde(default)]
    pub currently_syncing: Option<String>,
}

impl SyncState {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse state from a JSON document; `null` and `{}` give an empty state
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() || json.trim() == "null" {
            return Ok(Self::new());
        }
        serde_json::from_str(json)
            .map_err(|e| Error::state(format!("Failed to parse state JSON: {e}")))
    }

    /// Serialize to a JSON value for the sink
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Bookmark of a stream
    pub fn bookmark(&self, stream: &str) -> Option<&Bookmark> {
        self.bookmarks.get(stream)
    }

    /// Where an incremental stream resumes: its bookmark, else `start_date`
    pub fn resume_point(&self, stream: &str, start_date: DateTime<Utc>) -> DateTime<Utc> {
        self.bookmark(stream)
            .and_then(Bookmark::timestamp)
            .unwrap_or(start_date)
    }

    /// Fold a replication key value into the stream's bookmark.
    ///
    /// The bookmark only ever moves forward: it becomes the maximum of its
    /// current value and `value`. Returns whether it changed.
    pub fn incorporate(&mut self, stream: &str, field: &str, value: &str) -> bool {
        let candidate = Bookmark::new(field, value);
        let advances = match self.bookmarks.get(stream) {
            None => true,
            // stored marks may come from a state file in any offset or precision
            Some(current) => match (current.timestamp(), candidate.timestamp()) {
                (Some(current), Some(next)) => next > current,
                _ => normalize_datetime(&current.last_record) < candidate.last_record,
            },
        };
        if advances {
            self.bookmarks.insert(stream.to_string(), candidate);
        }
        advances
    }

    /// Mark a stream as in flight (or clear the marker)
    pub fn set_currently_syncing(&mut self, stream: Option<&str>) {
        self.currently_syncing = stream.map(ToString::to_string);
    }

    /// Drop a stream's bookmark
    pub fn clear_bookmark(&mut self, stream: &str) -> Option<Bookmark> {
        self.bookmarks.remove(stream)
    }
}
