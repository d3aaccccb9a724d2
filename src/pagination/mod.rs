//! Pagination module
//!
//! Supports: continuation-token retrieves and page-number REST collections
//!
//! # Overview
//!
//! A cursor drives repeated transport calls until the server signals
//! completion. Pages are pulled lazily, one per `next_page` call, and
//! records come out in the order the server returned them. Results of any
//! size are supported, from zero records to an unbounded number of pages.

mod cursors;
mod types;

pub use cursors::{PagedCursor, RetrieveCursor};
pub use types::{CursorPhase, PaginationState, RecordCursor};
