//! img2img request and result types.

use crate::interrogate::ImageInput;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One img2img request.
///
/// `prompt` is the only field the batch runner changes per image; it is
/// set to the composed prompt for the call and put back afterwards.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// Positive prompt sent to the host
    pub prompt: String,
    /// Negative prompt
    pub negative_prompt: String,
    /// Base64-encoded init images
    pub init_images: Vec<String>,
    /// Source image the init image came from (names the outputs)
    pub source: Option<PathBuf>,
    /// Extra img2img parameters passed through verbatim
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl GenerationRequest {
    /// Create a request with a base prompt and no init image yet.
    pub fn new(prompt: &str, negative_prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            negative_prompt: negative_prompt.to_string(),
            ..Default::default()
        }
    }

    /// Use `image` as the single init image.
    pub fn set_init_image(&mut self, image: &ImageInput) {
        self.init_images = vec![image.data.clone()];
        self.source = Some(image.path.clone());
    }

    /// Merge passthrough parameters from a TOML table.
    pub fn with_params(mut self, params: &toml::Table) -> Self {
        for (key, value) in params {
            match serde_json::to_value(value) {
                Ok(json) => {
                    self.params.insert(key.clone(), json);
                }
                Err(e) => tracing::warn!("Skipping img2img parameter {key:?}: {e}"),
            }
        }
        self
    }
}

/// What the host produced for one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Processed {
    /// Files written for the generated images
    pub images: Vec<PathBuf>,
    /// Host-reported generation info, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}
