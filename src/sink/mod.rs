//! Record sink module
//!
//! Where schema, record and state messages go. The sync engine only talks
//! to the `RecordSink` trait.

mod types;
mod writer;

pub use types::Message;
pub use writer::{JsonLinesSink, MemorySink, RecordSink};

#[cfg(test)]
mod tests;
