//! Stream descriptor types
//!
//! A stream is data, not a type: a `StreamDescriptor` names the remote
//! source, the schema and the replication strategy, and one generic runner
//! syncs any descriptor.

use crate::config::{BookmarkGranularity, SourceConfig};
use crate::error::{Error, Result};
use crate::schema::JsonSchema;
use crate::transform::FieldRule;
use crate::types::ReplicationMethod;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Source
// ============================================================================

/// Where a stream's records come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    /// A SOAP object type, walked with continuation tokens
    Soap {
        /// Remote object type, e.g. `Email`
        object_type: String,
    },
    /// A REST collection, walked by page number
    Rest {
        /// Path under the REST base, e.g. `/hub/v1/campaigns`
        endpoint: String,
    },
    /// Rows of a data extension, returned as property bags
    DataExtension {
        /// Customer key of the data extension
        customer_key: String,
    },
}

impl Source {
    /// Identifier of the remote object
    pub fn object_reference(&self) -> String {
        match self {
            Source::Soap { object_type } => object_type.clone(),
            Source::Rest { endpoint } => endpoint.clone(),
            Source::DataExtension { customer_key } => {
                format!("DataExtensionObject[{customer_key}]")
            }
        }
    }

    /// Whether records are fetched with server-side filters
    pub fn supports_filters(&self) -> bool {
        !matches!(self, Source::Rest { .. })
    }
}

// ============================================================================
// Replication
// ============================================================================

/// How a stream is replicated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationStrategy {
    /// Fetch everything, keep no bookmark
    FullTable,
    /// Fetch by date window from the bookmark on
    Incremental {
        /// Field watermarked between runs
        replication_key: String,
    },
}

impl ReplicationStrategy {
    /// Incremental replication on `replication_key`
    pub fn incremental(replication_key: impl Into<String>) -> Self {
        Self::Incremental {
            replication_key: replication_key.into(),
        }
    }

    /// The replication method name
    pub fn method(&self) -> ReplicationMethod {
        match self {
            Self::FullTable => ReplicationMethod::FullTable,
            Self::Incremental { .. } => ReplicationMethod::Incremental,
        }
    }

    /// The replication key, for incremental streams
    pub fn replication_key(&self) -> Option<&str> {
        match self {
            Self::FullTable => None,
            Self::Incremental { replication_key } => Some(replication_key),
        }
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// Everything needed to sync one stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    /// Stream id
    pub name: String,
    /// Remote source
    pub source: Source,
    /// Fields forming the record identity
    pub key_properties: Vec<String>,
    /// Candidate replication keys
    pub valid_replication_keys: Vec<String>,
    /// Replication strategy
    pub replication: ReplicationStrategy,
    /// Canonical record schema
    pub schema: JsonSchema,
    /// Reshaping applied to raw records
    pub rules: Vec<FieldRule>,
}

impl StreamDescriptor {
    /// Create a full-table descriptor with no rules
    pub fn new(name: impl Into<String>, source: Source, schema: JsonSchema) -> Self {
        Self {
            name: name.into(),
            source,
            key_properties: Vec::new(),
            valid_replication_keys: Vec::new(),
            replication: ReplicationStrategy::FullTable,
            schema,
            rules: Vec::new(),
        }
    }

    /// Set the key properties
    #[must_use]
    pub fn with_keys(mut self, keys: &[&str]) -> Self {
        self.key_properties = keys.iter().map(ToString::to_string).collect();
        self
    }

    /// Replicate incrementally on `replication_key`
    #[must_use]
    pub fn incremental(mut self, replication_key: &str) -> Self {
        if !self.valid_replication_keys.iter().any(|k| k == replication_key) {
            self.valid_replication_keys.push(replication_key.to_string());
        }
        self.replication = ReplicationStrategy::incremental(replication_key);
        self
    }

    /// Add a transform rule
    #[must_use]
    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Identifier of the remote object
    pub fn object_reference(&self) -> String {
        self.source.object_reference()
    }

    /// Replication method
    pub fn replication_method(&self) -> ReplicationMethod {
        self.replication.method()
    }

    /// Replication key, for incremental streams
    pub fn replication_key(&self) -> Option<&str> {
        self.replication.replication_key()
    }

    /// Fields that are always replicated: keys plus the replication key
    pub fn automatic_fields(&self) -> Vec<String> {
        let mut fields = self.key_properties.clone();
        if let Some(key) = self.replication_key() {
            if !fields.iter().any(|f| f == key) {
                fields.push(key.to_string());
            }
        }
        fields
    }

    /// Remote property that feeds canonical field `field`.
    ///
    /// `None` for fields attached locally by a constant rule.
    pub fn remote_property(&self, field: &str) -> Option<String> {
        for rule in &self.rules {
            match rule {
                FieldRule::Lift { target, path } if target == field => {
                    return Some(path.join("."));
                }
                FieldRule::Rename { from, to } if to == field => return Some(from.clone()),
                FieldRule::Constant { field: f, .. } if f == field => return None,
                _ => {}
            }
        }
        Some(field.to_string())
    }

    /// Remote properties to request for the selected canonical fields
    pub fn remote_properties<S: AsRef<str>>(&self, selected: &[S]) -> Vec<String> {
        let mut properties: Vec<String> = Vec::new();
        for field in selected {
            let field = field.as_ref();
            if self.schema.get_property(field).is_none() {
                continue;
            }
            if let Some(remote) = self.remote_property(field) {
                if !properties.contains(&remote) {
                    properties.push(remote);
                }
            }
        }
        properties
    }

    /// Check the descriptor can be synced as declared
    pub fn validate(&self) -> Result<()> {
        for key in &self.key_properties {
            if self.schema.get_property(key).is_none() {
                return Err(Error::catalog(format!(
                    "stream '{}': key property '{key}' is not in the schema",
                    self.name
                )));
            }
        }

        let Some(replication_key) = self.replication_key() else {
            return Ok(());
        };
        if !self.schema.get_property(replication_key).is_some_and(|p| p.is_date_time()) {
            return Err(Error::catalog(format!(
                "stream '{}': replication key '{replication_key}' is not a date-time field",
                self.name
            )));
        }
        if !self.source.supports_filters() || self.remote_property(replication_key).is_none() {
            return Err(Error::catalog(format!(
                "stream '{}': replication key '{replication_key}' cannot be filtered remotely",
                self.name
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Settings and stats
// ============================================================================

/// Run-wide knobs every stream sync reads
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// History start for streams without a bookmark
    pub start_date: DateTime<Utc>,
    /// Incremental window size
    pub date_window: Duration,
    /// Requested page size
    pub batch_size: u32,
    /// End of the last window, fixed at run start
    pub now: DateTime<Utc>,
    /// When bookmarks advance
    pub bookmark_granularity: BookmarkGranularity,
}

impl SyncSettings {
    /// Settings with a one-day window and the current time as the end
    pub fn new(start_date: DateTime<Utc>) -> Self {
        Self {
            start_date,
            date_window: Duration::days(1),
            batch_size: 2500,
            now: Utc::now(),
            bookmark_granularity: BookmarkGranularity::default(),
        }
    }

    /// Settings for a run configured by `config`
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            start_date: config.start_date()?,
            date_window: config.date_window(),
            batch_size: config.batch_size,
            now: Utc::now(),
            bookmark_granularity: config.bookmark_granularity,
        })
    }

    /// Pin the end of the last window
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Set the window size
    #[must_use]
    pub fn with_date_window(mut self, window: Duration) -> Self {
        self.date_window = window;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set bookmark granularity
    #[must_use]
    pub fn with_bookmark_granularity(mut self, granularity: BookmarkGranularity) -> Self {
        self.bookmark_granularity = granularity;
        self
    }
}

/// Counters for one stream sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    /// Records written to the sink
    pub records: usize,
    /// Records skipped because they did not fit the schema
    pub schema_mismatches: usize,
    /// Records skipped because the replication key was empty
    pub missing_replication_key: usize,
    /// Date windows walked
    pub windows: usize,
    /// Pages fetched
    pub pages: usize,
}
