//! Record transformation
//!
//! Converts raw wire records into the canonical shape of their stream:
//! nested IDs lifted to top-level fields, property bags flattened, parent
//! fields attached and text values coerced to the declared types.

mod coerce;
mod rules;

pub use coerce::{coerce_boolean, coerce_integer, coerce_number, coerce_value};
pub use rules::{flatten_property_bag, FieldRule, Transformer};
