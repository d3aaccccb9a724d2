//! Date windows for incremental queries
//!
//! `[start, end]` is cut into consecutive windows of a fixed size; each
//! window ends where the next begins and the last one ends at `end`.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// One closed time range queried in a single traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Inclusive end
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Whether the window covers no time
    pub fn is_degenerate(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Partition `[start, end]` into windows of `interval`.
///
/// If `start >= end` a single degenerate window `[start, start]` is
/// returned. A non-positive interval yields one window covering the range.
pub fn date_windows(start: DateTime<Utc>, end: DateTime<Utc>, interval: Duration) -> Vec<DateWindow> {
    if start >= end {
        return vec![DateWindow { start, end: start }];
    }
    if interval <= Duration::zero() {
        return vec![DateWindow { start, end }];
    }

    let mut windows = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let next = cursor
            .checked_add_signed(interval)
            .map_or(end, |n| n.min(end));
        windows.push(DateWindow {
            start: cursor,
            end: next,
        });
        cursor = next;
    }
    windows
}
