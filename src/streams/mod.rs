//! Stream module
//!
//! Data-driven stream descriptors and the single runner that syncs them.
//!
//! # Overview
//!
//! - `StreamDescriptor` - name, source, schema, keys and replication strategy
//! - `ReplicationStrategy` - full table or incremental on a replication key
//! - `StreamSync` - drives one descriptor through pages and date windows
//! - `known_streams` - the statically known object types
//!
//! # Example
//!
//! ```rust,ignore
//! let descriptor = known_streams().into_iter().find(|s| s.name == "emails").unwrap();
//! let mut sync = StreamSync::new(&descriptor, &["ID", "Name"]);
//! let stats = sync.sync(&transport, &settings, &mut state, &mut sink).await?;
//! ```

mod definitions;
mod runner;
mod types;

pub use definitions::known_streams;
pub use runner::{StreamPhase, StreamSync};
pub use types::{ReplicationStrategy, Source, StreamDescriptor, StreamStats, SyncSettings};

#[cfg(test)]
mod tests;
