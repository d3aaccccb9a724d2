//! Engine types
//!
//! Run statistics and the end-of-run report.

use crate::streams::StreamStats;
use serde::Serialize;

/// Statistics from a sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Streams that completed
    pub streams_synced: usize,
    /// Streams that failed with a recoverable error
    pub streams_failed: usize,
    /// Records written
    pub records_synced: usize,
    /// Records skipped for not matching their schema
    pub schema_mismatches: usize,
    /// Records skipped for lacking a replication key value
    pub missing_replication_key: usize,
    /// Pages fetched
    pub pages_fetched: usize,
    /// Date windows walked
    pub windows: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a completed stream
    pub fn add_stream(&mut self, stream: &StreamStats) {
        self.streams_synced += 1;
        self.add_counts(stream);
    }

    /// Fold in a failed stream; whatever it wrote still counts
    pub fn add_failure(&mut self, stream: &StreamStats) {
        self.streams_failed += 1;
        self.add_counts(stream);
    }

    fn add_counts(&mut self, stream: &StreamStats) {
        self.records_synced += stream.records;
        self.schema_mismatches += stream.schema_mismatches;
        self.missing_replication_key += stream.missing_replication_key;
        self.pages_fetched += stream.pages;
        self.windows += stream.windows;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// A stream that failed without aborting the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamFailure {
    /// Stream id
    pub stream: String,
    /// Error message
    pub cause: String,
}

impl std::fmt::Display for StreamFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.stream, self.cause)
    }
}

/// Outcome of a sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Run statistics
    pub stats: SyncStats,
    /// Streams that failed, in sync order
    pub failures: Vec<StreamFailure>,
}

impl SyncReport {
    /// Whether every selected stream completed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
