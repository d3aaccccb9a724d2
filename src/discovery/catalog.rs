//! The stream catalog of a run
//!
//! Built once, from the known streams plus whatever discovery found, and
//! read-only afterwards.

use super::data_extensions::DataExtensionDiscovery;
use super::types::DATA_EXTENSION_PREFIX;
use crate::error::{Error, Result};
use crate::streams::{known_streams, StreamDescriptor};
use crate::transport::Transport;
use std::collections::HashSet;

/// Every stream available to a run
#[derive(Debug, Clone, PartialEq)]
pub struct StreamCatalog {
    streams: Vec<StreamDescriptor>,
}

impl StreamCatalog {
    /// Build a catalog, rejecting invalid descriptors and duplicate names
    pub fn new(streams: Vec<StreamDescriptor>) -> Result<Self> {
        let mut names = HashSet::new();
        for stream in &streams {
            stream.validate()?;
            if !names.insert(stream.name.as_str()) {
                return Err(Error::catalog(format!(
                    "stream '{}' is defined twice",
                    stream.name
                )));
            }
        }
        Ok(Self { streams })
    }

    /// Catalog of the statically known streams only
    pub fn known() -> Result<Self> {
        Self::new(known_streams())
    }

    /// Catalog of the known streams plus every discovered data extension
    pub async fn discover(transport: &dyn Transport, batch_size: u32) -> Result<Self> {
        let mut streams = known_streams();
        streams.extend(
            DataExtensionDiscovery::new(transport, batch_size)
                .discover()
                .await?,
        );
        Self::new(streams)
    }

    /// Look a stream up by name
    pub fn get(&self, name: &str) -> Option<&StreamDescriptor> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Look a stream up, failing when it is missing
    pub fn require(&self, name: &str) -> Result<&StreamDescriptor> {
        self.get(name).ok_or_else(|| Error::StreamNotFound {
            stream: name.to_string(),
        })
    }

    /// All streams, in sync order
    pub fn streams(&self) -> &[StreamDescriptor] {
        &self.streams
    }

    /// Stream names, in sync order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.streams.iter().map(|s| s.name.as_str())
    }

    /// Number of streams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether the catalog has no streams
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

/// Whether a stream id names a data extension
pub fn is_data_extension(stream: &str) -> bool {
    stream.starts_with(DATA_EXTENSION_PREFIX)
}
