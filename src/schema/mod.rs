//! Schema module
//!
//! JSON-schema types for stream schemas and the record validation that
//! detects schema mismatches.

mod types;
mod validate;

pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};

#[cfg(test)]
mod tests;
