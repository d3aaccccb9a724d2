//! Common types used throughout mc-extract
//!
//! This module contains shared type definitions, type aliases,
//! and timestamp helpers used across multiple modules.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Replication
// ============================================================================

/// How a stream is replicated between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationMethod {
    /// Re-fetch the entire object on every sync; no bookmark
    #[default]
    FullTable,
    /// Fetch only records at or after the bookmark
    Incremental,
}

impl std::fmt::Display for ReplicationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplicationMethod::FullTable => write!(f, "FULL_TABLE"),
            ReplicationMethod::Incremental => write!(f, "INCREMENTAL"),
        }
    }
}

// ============================================================================
// Catalog Inclusion
// ============================================================================

/// Field inclusion marker carried in catalog metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inclusion {
    /// Always replicated (key properties and replication key)
    Automatic,
    /// Replicated when selected
    #[default]
    Available,
    /// Never replicated
    Unsupported,
}

// ============================================================================
// Timestamps
// ============================================================================

/// Parse a timestamp in any of the shapes the remote service or users produce.
///
/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.fff]` (taken as UTC),
/// US-style `M/D/YYYY H:MM:SS AM` and bare dates.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%m/%d/%Y %I:%M:%S %p",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Format a timestamp the way bookmarks and filters carry it
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Normalise a timestamp string so that lexicographic order matches time order.
///
/// Unparseable values are returned unchanged.
pub fn normalize_datetime(s: &str) -> String {
    parse_datetime(s).map_or_else(|| s.to_string(), |dt| format_datetime(&dt))
}
