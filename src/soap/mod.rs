//! SOAP retrieve protocol
//!
//! Builds `RetrieveRequestMsg` envelopes and parses `RetrieveResponseMsg`
//! replies into JSON records.
//!
//! # Overview
//!
//! A retrieve traversal is a sequence of calls sharing object type,
//! properties and filter. Every call after the first carries the
//! `RequestID` the server returned, and the traversal ends when the
//! server stops answering `MoreDataAvailable`.

mod envelope;
mod filter;
mod response;

pub use envelope::RetrieveRequest;
pub use filter::{FilterValue, LogicalOperator, SearchFilter, SimpleOperator};
pub use response::{
    classify_remote_error, parse_retrieve_response, soap_fault, RetrieveResponse,
    MORE_DATA_AVAILABLE,
};
