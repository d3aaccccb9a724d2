//! Sink implementations
//!
//! `JsonLinesSink` writes one JSON message per line (stdout in the binary);
//! `MemorySink` keeps messages for inspection.

use super::types::Message;
use crate::error::Result;
use crate::schema::JsonSchema;
use crate::state::SyncState;
use crate::types::JsonObject;
use std::io::{BufWriter, Stdout, Write};

/// Destination for schema, record and state messages
pub trait RecordSink: Send {
    /// Announce a stream's schema; called once before its records
    fn write_schema(
        &mut self,
        stream: &str,
        schema: &JsonSchema,
        key_properties: &[String],
        replication_key: Option<&str>,
    ) -> Result<()>;

    /// Emit one record
    fn write_record(&mut self, stream: &str, record: JsonObject) -> Result<()>;

    /// Checkpoint the sync state
    fn write_state(&mut self, state: &SyncState) -> Result<()>;
}

fn schema_message(
    stream: &str,
    schema: &JsonSchema,
    key_properties: &[String],
    replication_key: Option<&str>,
) -> Message {
    Message::Schema {
        stream: stream.to_string(),
        schema: schema.clone(),
        key_properties: key_properties.to_vec(),
        bookmark_properties: replication_key.map(ToString::to_string).into_iter().collect(),
    }
}

// ============================================================================
// JSON lines
// ============================================================================

/// Writes messages as JSON lines
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl JsonLinesSink<BufWriter<Stdout>> {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self::new(BufWriter::new(std::io::stdout()))
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Sink writing to `writer`
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, message: &Message) -> Result<()> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn write_schema(
        &mut self,
        stream: &str,
        schema: &JsonSchema,
        key_properties: &[String],
        replication_key: Option<&str>,
    ) -> Result<()> {
        self.emit(&schema_message(stream, schema, key_properties, replication_key))
    }

    fn write_record(&mut self, stream: &str, record: JsonObject) -> Result<()> {
        self.emit(&Message::record(stream, record))
    }

    fn write_state(&mut self, state: &SyncState) -> Result<()> {
        self.emit(&Message::state(state.to_value()))?;
        // downstream persists state as soon as it sees it
        self.writer.flush()?;
        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Collects messages in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Vec<Message>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message, in emission order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Records emitted for `stream`
    pub fn records(&self, stream: &str) -> Vec<&JsonObject> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Record { stream: s, record, .. } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Streams a schema was announced for, in order
    pub fn schema_streams(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|m| m.is_schema())
            .filter_map(Message::stream)
            .collect()
    }

    /// Every state checkpoint, in order
    pub fn states(&self) -> Vec<SyncState> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::State { value } => serde_json::from_value(value.clone()).ok(),
                _ => None,
            })
            .collect()
    }

    /// The last state checkpoint
    pub fn last_state(&self) -> Option<SyncState> {
        self.states().pop()
    }
}

impl RecordSink for MemorySink {
    fn write_schema(
        &mut self,
        stream: &str,
        schema: &JsonSchema,
        key_properties: &[String],
        replication_key: Option<&str>,
    ) -> Result<()> {
        self.messages
            .push(schema_message(stream, schema, key_properties, replication_key));
        Ok(())
    }

    fn write_record(&mut self, stream: &str, record: JsonObject) -> Result<()> {
        self.messages.push(Message::Record {
            stream: stream.to_string(),
            record,
            time_extracted: None,
        });
        Ok(())
    }

    fn write_state(&mut self, state: &SyncState) -> Result<()> {
        self.messages.push(Message::state(state.to_value()));
        Ok(())
    }
}
