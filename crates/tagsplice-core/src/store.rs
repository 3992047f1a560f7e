//! Saved custom filter.
//!
//! A single UTF-8 text file holding one comma-separated tag string. Reads
//! return an empty string when the file does not exist yet; saves replace
//! the whole file.

use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};

/// Flat-file store for the last saved custom filter.
#[derive(Debug, Clone)]
pub struct FilterStore {
    path: PathBuf,
}

impl FilterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved filter, or an empty string if none was saved.
    pub fn load(&self) -> PipelineResult<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        std::fs::read_to_string(&self.path)
            .map(|s| s.trim().to_string())
            .map_err(|e| self.error(e))
    }

    /// Overwrite the saved filter.
    pub fn save(&self, filter: &str) -> PipelineResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        std::fs::write(&self.path, filter.trim()).map_err(|e| self.error(e))?;
        tracing::info!("Custom filter saved to {:?}", self.path);
        Ok(())
    }

    /// Remove the saved filter. Clearing a missing file is not an error.
    pub fn clear(&self) -> PipelineResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.error(e)),
        }
    }

    fn error(&self, e: std::io::Error) -> PipelineError {
        PipelineError::Store {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}
