//! Save file for an in-progress match
//!
//! The document on disk is exactly the serialized `GameState`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::models::GameState;

pub struct SaveFile {
    path: PathBuf,
}

impl SaveFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `state`, replacing any previous save
    #[instrument(skip(self, state), fields(path = %self.path.display()))]
    pub fn save(&self, state: &GameState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target, then rename over it
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, state.to_json()?)?;
        fs::rename(&tmp, &self.path)?;

        info!(moves = state.move_count(), "Match saved");
        Ok(())
    }

    /// Load the saved match. `Ok(None)` when nothing has been saved yet.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Option<GameState>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No saved match");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(GameState::from_json(&json)?))
    }
}
