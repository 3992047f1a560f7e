//! Interrogator trait and the types passed through it.

use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use base64::Engine;
use std::path::{Path, PathBuf};

/// Base64-encoded source image, ready for an HTTP backend.
///
/// Keeps the source path so file-based backends can find sidecar data.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Source file path
    pub path: PathBuf,
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes, inferring the MIME type from
    /// the path's extension.
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let media_type = match ext.as_str() {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "bmp" => "image/bmp",
            other => {
                tracing::warn!("Unknown image extension '{other}', defaulting to image/png");
                "image/png"
            }
        };

        Self {
            path: path.to_path_buf(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Read an image from disk.
    pub async fn load(path: &Path) -> PipelineResult<Self> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self::from_bytes(path, &bytes))
    }
}

/// One entry of the user's model selection: a backend and optionally one of
/// its models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    /// Backend name ("host", "tagger", "caption")
    pub backend: String,
    /// Model name; `None` means the backend's default model
    pub model: Option<String>,
}

impl ModelSelection {
    /// Parse `backend:model` or a bare `backend`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        match s.split_once(':') {
            Some((backend, model)) => {
                let (backend, model) = (backend.trim(), model.trim());
                if backend.is_empty() || model.is_empty() {
                    return None;
                }
                Some(Self {
                    backend: backend.to_lowercase(),
                    model: Some(model.to_string()),
                })
            }
            None => Some(Self {
                backend: s.to_lowercase(),
                model: None,
            }),
        }
    }

    /// Display label, `backend:model` or just `backend`.
    pub fn label(&self) -> String {
        match &self.model {
            Some(model) => format!("{}:{model}", self.backend),
            None => self.backend.clone(),
        }
    }
}

/// Capability implemented by every interrogation backend.
///
/// Uses `async_trait` because the registry holds `Box<dyn Interrogator>`.
#[async_trait]
pub trait Interrogator: Send + Sync {
    /// Backend name used in selections (e.g., "tagger").
    fn name(&self) -> &str;

    /// Model used when a selection names only the backend.
    fn default_model(&self) -> &str;

    /// Check whether the backend is configured and reachable.
    async fn available(&self) -> bool;

    /// List the models this backend can run.
    async fn models(&self) -> PipelineResult<Vec<String>>;

    /// Interrogate one image with one model, returning a comma-separated
    /// tag string.
    async fn run(&self, image: &ImageInput, model: &str) -> PipelineResult<String>;

    /// Release any loaded models. Backends without that notion do nothing.
    async fn unload(&self) -> PipelineResult<()> {
        Ok(())
    }
}
