//! Pagination types and traits
//!
//! Defines the cursor state machine shared by both pagination flavors.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Phase of one traversal.
///
/// `Start -> Fetching -> (More -> Fetching)* -> Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorPhase {
    /// No call made yet
    #[default]
    Start,
    /// A call is in flight
    Fetching,
    /// The last page announced another one
    More,
    /// The server signalled completion (or a call failed)
    Done,
}

impl std::fmt::Display for CursorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CursorPhase::Start => "start",
            CursorPhase::Fetching => "fetching",
            CursorPhase::More => "more",
            CursorPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Tracks pagination state during a traversal
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Current phase
    pub phase: CursorPhase,
    /// Page number of the next REST call (1-based)
    pub page: u32,
    /// Continuation token for the next retrieve call
    pub continuation: Option<String>,
    /// Remote calls made so far
    pub calls: u32,
    /// Total records fetched so far
    pub total_fetched: u64,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Default::default()
        }
    }

    /// Whether the traversal is finished
    pub fn is_done(&self) -> bool {
        self.phase == CursorPhase::Done
    }

    /// Record that a call is about to be made
    pub fn begin_fetch(&mut self) {
        self.phase = CursorPhase::Fetching;
        self.calls += 1;
    }

    /// Record a page and move to `More` or `Done`
    pub fn finish_fetch(&mut self, records: usize, more: bool) {
        self.total_fetched += records as u64;
        self.phase = if more {
            CursorPhase::More
        } else {
            CursorPhase::Done
        };
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.phase = CursorPhase::Done;
    }
}

/// A lazy, finite traversal over pages of raw records.
///
/// Each cursor value is one traversal; start a fresh one to read again.
#[async_trait]
pub trait RecordCursor: Send {
    /// Fetch the next page; `None` once the traversal is done
    async fn next_page(&mut self) -> Result<Option<Vec<Value>>>;

    /// Current traversal state
    fn state(&self) -> &PaginationState;

    /// Drain the whole traversal into memory
    async fn collect_all(&mut self) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        while let Some(page) = self.next_page().await? {
            records.extend(page);
        }
        Ok(records)
    }
}
