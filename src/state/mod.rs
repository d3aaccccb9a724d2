//! State management module
//!
//! Bookmarks make incremental syncs resumable; date windows bound the size
//! of a single incremental query.
//!
//! # Overview
//!
//! The state module provides:
//! - `SyncState` - bookmarks per stream plus the in-flight stream marker
//! - `date_windows` - contiguous windows from the resume point to now
//! - `StateManager` - state file loading and atomic saving

mod manager;
mod types;
mod windows;

pub use manager::StateManager;
pub use types::{Bookmark, SyncState};
pub use windows::{date_windows, DateWindow};

#[cfg(test)]
mod tests;
