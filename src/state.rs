// ABOUTME: Durable record of delivered document ids and last-run metadata
// ABOUTME: First run is an explicit None branch, not a file-existence check in callers

use crate::{storage::write_atomic, Error, Result, SyncState};
use std::fs;
use std::path::PathBuf;

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        StateStore { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// `None` means no prior state (first run). A present-but-unparsable
    /// file is an error: silently starting over would re-deliver everything.
    pub fn load(&self) -> Result<Option<SyncState>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let state: SyncState = serde_json::from_str(&content).map_err(|e| {
            Error::Persistence(format!("{} is corrupt: {}", self.path.display(), e))
        })?;
        Ok(Some(state))
    }

    pub fn save(&self, state: &SyncState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        write_atomic(&self.path, json.as_bytes())
            .map_err(|e| Error::Persistence(format!("could not save {}: {}", self.path.display(), e)))
    }
}
