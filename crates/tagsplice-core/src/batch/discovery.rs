//! Finding input images.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::error::{PipelineError, PipelineResult};

/// Finds input images in a file or directory.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

/// An input image found on disk.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Collect the images at `path`, sorted by path.
    ///
    /// A file is returned as-is if its extension is supported. A directory
    /// is scanned one level deep, or fully when `recursive` is set. Hidden
    /// entries are skipped.
    pub fn discover(&self, path: &Path) -> PipelineResult<Vec<DiscoveredFile>> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        if path.is_file() {
            let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            return Ok(if self.is_supported(path) {
                vec![DiscoveredFile {
                    path: path.to_path_buf(),
                    size,
                }]
            } else {
                tracing::warn!("Unsupported input file: {:?}", path);
                vec![]
            });
        }

        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let mut files: Vec<DiscoveredFile> = WalkDir::new(path)
            .max_depth(max_depth)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.is_supported(e.path()))
            .map(|e| DiscoveredFile {
                size: e.metadata().map(|m| m.len()).unwrap_or(0),
                path: e.into_path(),
            })
            .collect();

        // Deterministic batch order
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.eq_ignore_ascii_case(ext))
            })
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}
