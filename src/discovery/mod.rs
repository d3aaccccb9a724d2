//! Schema discovery module
//!
//! Data extensions are user-defined tables whose shape is only known at
//! runtime. Discovery reads their field metadata and synthesizes a
//! `StreamDescriptor` for each, then merges them with the known streams
//! into an immutable `StreamCatalog`.
//!
//! # Rules
//!
//! - stream id: `data_extension.` + the lower-cased, alphanumeric name
//! - keys: `_CustomObjectKey` plus the primary key fields, sorted
//! - replication key: first of `ModifiedDate`, `JoinDate`, `_ModifiedDate`,
//!   `_CreatedDate` present as a date field; full table otherwise
//! - type mapping: `Boolean` → boolean, `Decimal` → number (decimal),
//!   `Number` → integer, `Date` → date-time, anything else → string

mod catalog;
mod data_extensions;
mod types;

pub use catalog::{is_data_extension, StreamCatalog};
pub use data_extensions::{synthesize, DataExtensionDiscovery};
pub use types::{
    choose_replication_key, data_extension_stream_id, field_type_schema, DiscoveredField,
    FieldSet, CATEGORY_FIELD, CUSTOM_OBJECT_KEY, DATA_EXTENSION_PREFIX, REPLICATION_KEY_PRIORITY,
};
