//! Error types for tagsplice.
//!
//! Errors are organized by stage so messages carry the context a user needs
//! to act on them (backend, model, file path, HTTP status).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for tagsplice operations.
#[derive(Error, Debug)]
pub enum TagSpliceError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Batch pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// An interrogator backend failed to produce tags
    #[error("Interrogation failed ({backend}/{model}): {message}")]
    Interrogation {
        backend: String,
        model: String,
        message: String,
        status_code: Option<u16>,
    },

    /// The img2img call failed
    #[error("Generation failed: {message}")]
    Generation {
        message: String,
        status_code: Option<u16>,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// A model selection names a backend that is not registered
    #[error("Unknown interrogator backend: {0}")]
    UnknownBackend(String),

    /// Input file not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Input file exists but could not be read
    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// Reading or writing the saved custom filter failed
    #[error("Custom filter store error at {path}: {message}")]
    Store { path: PathBuf, message: String },
}

impl PipelineError {
    /// Build an interrogation error without an HTTP status.
    pub fn interrogation(backend: &str, model: &str, message: impl Into<String>) -> Self {
        Self::Interrogation {
            backend: backend.to_string(),
            model: model.to_string(),
            message: message.into(),
            status_code: None,
        }
    }
}

/// Convenience type alias for tagsplice results.
pub type Result<T> = std::result::Result<T, TagSpliceError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
