//! State file persistence
//!
//! Loads the input state of a run and writes the final state with an
//! atomic replace (temp file, then rename).

use super::types::SyncState;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads and writes a state file
#[derive(Debug, Clone)]
pub struct StateManager {
    path: PathBuf,
}

impl StateManager {
    /// Create a manager for the state file at `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state; a missing file gives an empty state
    pub fn load(&self) -> Result<SyncState> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No state file, starting fresh");
            return Ok(SyncState::new());
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
        SyncState::from_json(&contents)
    }

    /// Write `state` to the file
    pub async fn save(&self, state: &SyncState) -> Result<()> {
        let contents = serde_json::to_string_pretty(state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?;

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        debug!(path = %self.path.display(), "State saved");
        Ok(())
    }
}
