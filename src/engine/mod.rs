//! Execution engine module
//!
//! Stream orchestration for a sync run.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - runs the selected streams one after another
//! - `SyncStats` - counters for the run
//! - `SyncReport` - stats plus the streams that failed
//!
//! Streams run strictly in sequence. A stream-level remote error (bad field
//! selection, missing permission, other logical errors) fails that stream
//! and the run moves on; anything else aborts the run. State is written
//! after every stream, failed or not.

mod types;

pub use types::{StreamFailure, SyncReport, SyncStats};

use crate::catalog::ConfiguredCatalog;
use crate::discovery::StreamCatalog;
use crate::error::Result;
use crate::pagination::{RecordCursor, RetrieveCursor};
use crate::sink::RecordSink;
use crate::soap::RetrieveRequest;
use crate::state::SyncState;
use crate::streams::{StreamSync, SyncSettings};
use crate::transport::Transport;
use std::time::Instant;
use tracing::{error, info, warn};

/// Sync engine for orchestrating data extraction
pub struct SyncEngine<'a> {
    transport: &'a dyn Transport,
    settings: SyncSettings,
}

impl<'a> SyncEngine<'a> {
    /// Create a new sync engine
    pub fn new(transport: &'a dyn Transport, settings: SyncSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Settings every stream runs with
    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Prove the credentials work with one single-row retrieve
    pub async fn check(&self) -> Result<()> {
        let request = RetrieveRequest::new("DataFolder", vec!["ID".to_string()]).with_batch_size(1);
        let mut cursor = RetrieveCursor::new(self.transport, request);
        let rows = cursor.next_page().await?.map_or(0, |page| page.len());
        info!(rows, "Connection check succeeded");
        Ok(())
    }

    /// Known streams plus discovered data extensions
    pub async fn discover(&self) -> Result<StreamCatalog> {
        StreamCatalog::discover(self.transport, self.settings.batch_size).await
    }

    /// Build the stream catalog a selection needs, then sync it.
    ///
    /// Discovery only runs when a data extension is selected.
    pub async fn sync_selected(
        &self,
        selection: &ConfiguredCatalog,
        state: &mut SyncState,
        sink: &mut dyn RecordSink,
    ) -> Result<SyncReport> {
        let catalog = if selection.needs_discovery() {
            self.discover().await?
        } else {
            StreamCatalog::known()?
        };
        self.sync(&catalog, selection, state, sink).await
    }

    /// Sync every selected stream of `catalog`, in catalog order.
    ///
    /// Returns `Err` only for errors that abort the run; stream failures
    /// are listed in the report.
    pub async fn sync(
        &self,
        catalog: &StreamCatalog,
        selection: &ConfiguredCatalog,
        state: &mut SyncState,
        sink: &mut dyn RecordSink,
    ) -> Result<SyncReport> {
        let start = Instant::now();
        let mut report = SyncReport::default();

        for entry in selection.selected_streams() {
            if catalog.get(&entry.tap_stream_id).is_none() {
                warn!(stream = %entry.tap_stream_id, "Selected stream is not in the catalog");
                report.failures.push(StreamFailure {
                    stream: entry.tap_stream_id.clone(),
                    cause: format!("stream '{}' not found", entry.tap_stream_id),
                });
            }
        }

        for descriptor in catalog.streams() {
            let Some(entry) = selection.get(&descriptor.name).filter(|e| e.is_selected()) else {
                continue;
            };

            let fields = entry.selected_fields();
            let mut stream = StreamSync::new(descriptor, &fields);

            state.set_currently_syncing(Some(&descriptor.name));
            sink.write_state(state)?;
            sink.write_schema(
                &descriptor.name,
                stream.schema(),
                &descriptor.key_properties,
                descriptor.replication_key(),
            )?;

            match stream.sync(self.transport, &self.settings, state, sink).await {
                Ok(stats) => report.stats.add_stream(&stats),
                Err(e) if e.is_stream_recoverable() => {
                    error!(stream = %descriptor.name, error = %e, "Stream failed, continuing with the next one");
                    report.stats.add_failure(&stream.stats());
                    report.failures.push(StreamFailure {
                        stream: descriptor.name.clone(),
                        cause: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(stream = %descriptor.name, error = %e, "Aborting sync");
                    return Err(e);
                }
            }
            sink.write_state(state)?;
        }

        state.set_currently_syncing(None);
        sink.write_state(state)?;

        report.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            streams = report.stats.streams_synced,
            failed = report.stats.streams_failed,
            records = report.stats.records_synced,
            duration_ms = report.stats.duration_ms,
            "Sync finished"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for SyncEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
