//! Catalog module
//!
//! Stream and field selection metadata exchanged with the user: `discover`
//! prints a `ConfiguredCatalog`, `sync` honours the selections in it.
//! Key properties and replication keys are `automatic` and always
//! replicated; unselected streams are skipped entirely.

mod types;

pub use types::{CatalogEntry, ConfiguredCatalog, Metadata, MetadataEntry};
