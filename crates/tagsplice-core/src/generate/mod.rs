//! Image generation: the host's img2img entry point.
//!
//! The batch runner hands every composed prompt to an [`ImageGenerator`]
//! exactly once per image.

pub(crate) mod img2img;
pub(crate) mod request;

pub use img2img::Img2ImgClient;
pub use request::{GenerationRequest, Processed};

use crate::error::PipelineResult;
use async_trait::async_trait;

/// Anything that can run one img2img request.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generator name for logging.
    fn name(&self) -> &str;

    /// Run the request and return what the host produced.
    async fn process(&self, request: &GenerationRequest) -> PipelineResult<Processed>;
}

/// Generator that produces nothing; used for `--dry-run`.
pub struct DryRun;

#[async_trait]
impl ImageGenerator for DryRun {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn process(&self, request: &GenerationRequest) -> PipelineResult<Processed> {
        tracing::info!("Dry run, prompt: {}", request.prompt);
        Ok(Processed::default())
    }
}
