//! Generic stream sync
//!
//! One runner drives every descriptor. Full-table streams go
//! START → PAGING → DONE; incremental streams go
//! START → WINDOWING → PAGING (per window) → DONE.

use super::types::{ReplicationStrategy, Source, StreamDescriptor, StreamStats, SyncSettings};
use crate::config::BookmarkGranularity;
use crate::error::{Error, Result};
use crate::pagination::{PagedCursor, RecordCursor, RetrieveCursor};
use crate::sink::RecordSink;
use crate::soap::{RetrieveRequest, SearchFilter};
use crate::state::{date_windows, DateWindow, SyncState};
use crate::transform::Transformer;
use crate::transport::Transport;
use crate::types::{normalize_datetime, JsonObject};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

/// REST collections cap their page size well below SOAP batch sizes
const MAX_REST_PAGE_SIZE: u32 = 500;

/// Where a stream sync currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// Nothing fetched yet
    Start,
    /// Computing date windows from the bookmark
    Windowing,
    /// Walking pages
    Paging,
    /// Finished
    Done,
}

impl fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamPhase::Start => "start",
            StreamPhase::Windowing => "windowing",
            StreamPhase::Paging => "paging",
            StreamPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// A descriptor bound to its field selection, ready to sync
#[derive(Debug)]
pub struct StreamSync<'d> {
    descriptor: &'d StreamDescriptor,
    transformer: Transformer,
    properties: Vec<String>,
    phase: StreamPhase,
    stats: StreamStats,
}

impl<'d> StreamSync<'d> {
    /// Prepare a sync of `descriptor` restricted to `selected` fields.
    ///
    /// Automatic fields are always included.
    pub fn new<S: AsRef<str>>(descriptor: &'d StreamDescriptor, selected: &[S]) -> Self {
        let mut fields = descriptor.automatic_fields();
        for field in selected {
            let field = field.as_ref();
            if !fields.iter().any(|f| f == field) {
                fields.push(field.to_string());
            }
        }

        let schema = descriptor.schema.select(&fields);
        let properties = descriptor.remote_properties(&fields);
        Self {
            descriptor,
            transformer: Transformer::new(schema, descriptor.rules.clone()),
            properties,
            phase: StreamPhase::Start,
            stats: StreamStats::default(),
        }
    }

    /// Prepare a sync of every field in the schema
    pub fn all_fields(descriptor: &'d StreamDescriptor) -> Self {
        let fields: Vec<&str> = descriptor.schema.field_names().collect();
        Self::new(descriptor, &fields)
    }

    /// The descriptor being synced
    pub fn descriptor(&self) -> &StreamDescriptor {
        self.descriptor
    }

    /// Schema of the records this sync emits
    pub fn schema(&self) -> &crate::schema::JsonSchema {
        self.transformer.schema()
    }

    /// Remote properties requested
    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    /// Current phase
    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    /// Counters so far
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Run the stream to completion.
    ///
    /// Records go to `sink`; incremental streams fold their high-water mark
    /// into `state`. Schema mismatches are counted and skipped, anything else
    /// ends the stream with an error.
    pub async fn sync(
        &mut self,
        transport: &dyn Transport,
        settings: &SyncSettings,
        state: &mut SyncState,
        sink: &mut dyn RecordSink,
    ) -> Result<StreamStats> {
        info!(
            stream = %self.descriptor.name,
            object = %self.descriptor.object_reference(),
            method = %self.descriptor.replication_method(),
            "Starting stream"
        );

        let result = match self.descriptor.replication.clone() {
            ReplicationStrategy::FullTable => self.sync_full_table(transport, settings, sink).await,
            ReplicationStrategy::Incremental { replication_key } => {
                self.sync_incremental(transport, settings, &replication_key, state, sink)
                    .await
            }
        };
        self.phase = StreamPhase::Done;
        result?;

        info!(
            stream = %self.descriptor.name,
            records = self.stats.records,
            schema_mismatches = self.stats.schema_mismatches,
            pages = self.stats.pages,
            "Finished stream"
        );
        Ok(self.stats)
    }

    async fn sync_full_table(
        &mut self,
        transport: &dyn Transport,
        settings: &SyncSettings,
        sink: &mut dyn RecordSink,
    ) -> Result<()> {
        self.phase = StreamPhase::Paging;
        let mut cursor = self.cursor(transport, settings, None);
        while let Some(page) = cursor.next_page().await? {
            self.stats.pages += 1;
            for raw in page {
                if let Some(record) = self.transform(raw) {
                    sink.write_record(&self.descriptor.name, record)?;
                    self.stats.records += 1;
                }
            }
        }
        Ok(())
    }

    async fn sync_incremental(
        &mut self,
        transport: &dyn Transport,
        settings: &SyncSettings,
        replication_key: &str,
        state: &mut SyncState,
        sink: &mut dyn RecordSink,
    ) -> Result<()> {
        let stream = self.descriptor.name.clone();

        self.phase = StreamPhase::Windowing;
        let resume = state.resume_point(&stream, settings.start_date);
        let windows = date_windows(resume, settings.now, settings.date_window);
        debug!(stream = %stream, from = %resume, windows = windows.len(), "Computed date windows");

        let remote_key = self
            .descriptor
            .remote_property(replication_key)
            .ok_or_else(|| {
                Error::catalog(format!(
                    "stream '{stream}': replication key '{replication_key}' is not a remote property"
                ))
            })?;

        let mut max_seen: Option<String> = None;
        let last = windows.len().saturating_sub(1);
        for (i, window) in windows.into_iter().enumerate() {
            self.phase = StreamPhase::Paging;
            // only the final window includes its end
            let filter = SearchFilter::window(remote_key.clone(), window.start, window.end, i == last);
            let mut cursor = self.cursor(transport, settings, Some(filter));

            while let Some(page) = cursor.next_page().await? {
                self.stats.pages += 1;
                for raw in page {
                    let Some(record) = self.transform(raw) else {
                        continue;
                    };
                    let Some(value) = replication_value(&record, replication_key) else {
                        warn!(
                            stream = %stream,
                            replication_key,
                            "Record has no replication key value, skipping"
                        );
                        self.stats.missing_replication_key += 1;
                        continue;
                    };

                    sink.write_record(&stream, record)?;
                    self.stats.records += 1;
                    if max_seen.as_ref().map_or(true, |max| value > *max) {
                        max_seen = Some(value);
                    }
                }
            }

            self.stats.windows += 1;
            self.finish_window(&window, replication_key, max_seen.as_deref(), settings, state, sink)?;
        }

        if let Some(max) = max_seen {
            if state.incorporate(&stream, replication_key, &max) {
                info!(stream = %stream, bookmark = %max, "Advanced bookmark");
            }
        }
        Ok(())
    }

    fn finish_window(
        &self,
        window: &DateWindow,
        replication_key: &str,
        max_seen: Option<&str>,
        settings: &SyncSettings,
        state: &mut SyncState,
        sink: &mut dyn RecordSink,
    ) -> Result<()> {
        if settings.bookmark_granularity == BookmarkGranularity::Window {
            if let Some(max) = max_seen {
                state.incorporate(&self.descriptor.name, replication_key, max);
            }
        }
        debug!(stream = %self.descriptor.name, window = %window, "Finished window");
        sink.write_state(state)
    }

    fn cursor<'t>(
        &self,
        transport: &'t dyn Transport,
        settings: &SyncSettings,
        filter: Option<SearchFilter>,
    ) -> Box<dyn RecordCursor + 't> {
        match &self.descriptor.source {
            Source::Rest { endpoint } => Box::new(PagedCursor::new(
                transport,
                endpoint.clone(),
                settings.batch_size.min(MAX_REST_PAGE_SIZE),
            )),
            source => {
                let mut request =
                    RetrieveRequest::new(source.object_reference(), self.properties.clone())
                        .with_batch_size(settings.batch_size);
                if let Some(filter) = filter {
                    request = request.with_filter(filter);
                }
                Box::new(RetrieveCursor::new(transport, request))
            }
        }
    }

    fn transform(&mut self, raw: Value) -> Option<JsonObject> {
        match self.transformer.transform(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(stream = %self.descriptor.name, error = %e, "Skipping record that does not match the schema");
                self.stats.schema_mismatches += 1;
                None
            }
        }
    }
}

/// Normalised replication key value of a canonical record
fn replication_value(record: &JsonObject, replication_key: &str) -> Option<String> {
    match record.get(replication_key)? {
        Value::String(s) if !s.trim().is_empty() => Some(normalize_datetime(s)),
        _ => None,
    }
}
