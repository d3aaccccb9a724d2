//! Transport module
//!
//! Executes single remote calls: a page of a SOAP retrieve traversal or a
//! page of a REST collection.
//!
//! `HttpTransport` attaches a fresh bearer token to every attempt, retries
//! transient faults through the HTTP client and classifies logical errors
//! reported inside successful responses. `MockTransport` serves the same
//! contract from memory.

mod http;
pub mod mock;
mod types;

pub use http::HttpTransport;
pub use mock::MockTransport;
pub use types::{PageInfo, PageParams, RestPage, Transport};
