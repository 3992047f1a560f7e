//! img2img over the web UI's HTTP API.
//!
//! Posts to `/sdapi/v1/img2img` and writes the returned base64 images to
//! the output directory as `<stem>_<ext>-<n>.png`. A name that is already
//! taken gets a `-<k>` suffix instead of being overwritten.

use super::request::{GenerationRequest, Processed};
use super::ImageGenerator;
use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::interrogate::retry::{with_retry, RetryPolicy};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// HTTP img2img client.
pub struct Img2ImgClient {
    endpoint: String,
    output_dir: PathBuf,
    client: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
}

/// `/sdapi/v1/img2img` request body.
#[derive(Serialize)]
struct Img2ImgBody<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    init_images: &'a [String],
    #[serde(flatten)]
    params: &'a serde_json::Map<String, serde_json::Value>,
}

/// `/sdapi/v1/img2img` response.
#[derive(Deserialize)]
struct Img2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    info: Option<String>,
}

impl Img2ImgClient {
    pub fn new(endpoint: &str, output_dir: PathBuf, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            output_dir,
            client: reqwest::Client::new(),
            timeout,
            retry,
        }
    }

    /// Client for `[generation]`, with `[limits]` timeout and `[pipeline]` retries.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.generation.endpoint,
            config.output_dir(),
            Duration::from_millis(config.limits.generate_timeout_ms),
            RetryPolicy::from(&config.pipeline),
        )
    }

    async fn post_once(&self, request: &GenerationRequest) -> PipelineResult<Img2ImgResponse> {
        let url = format!("{}/sdapi/v1/img2img", self.endpoint);
        let body = Img2ImgBody {
            prompt: &request.prompt,
            negative_prompt: &request.negative_prompt,
            init_images: &request.init_images,
            params: &request.params,
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PipelineError::Timeout {
                        stage: "img2img".to_string(),
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    PipelineError::Generation {
                        message: format!("Request failed: {e}"),
                        status_code: None,
                    }
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Generation {
                message: format!("HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        resp.json().await.map_err(|e| PipelineError::Generation {
            message: format!("Failed to parse img2img response: {e}"),
            status_code: None,
        })
    }

    /// Decode and write the returned images.
    async fn save_images(
        &self,
        request: &GenerationRequest,
        images: &[String],
    ) -> PipelineResult<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| write_error(&self.output_dir, e))?;

        let mut written = Vec::with_capacity(images.len());
        for (i, encoded) in images.iter().enumerate() {
            // The host may prefix a data URL header
            let payload = encoded.split_once(',').map_or(encoded.as_str(), |(_, b)| b);
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(payload)
                .map_err(|e| PipelineError::Generation {
                    message: format!("Invalid base64 image in response: {e}"),
                    status_code: None,
                })?;

            let path = self.write_new(request.source.as_deref(), i, &bytes).await?;
            written.push(path);
        }
        Ok(written)
    }

    /// Write `bytes` under the first free name for this source and index.
    async fn write_new(
        &self,
        source: Option<&Path>,
        index: usize,
        bytes: &[u8],
    ) -> PipelineResult<PathBuf> {
        let mut attempt = 0;
        loop {
            let path = self.output_dir.join(output_name(source, index, attempt));
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match opened {
                Ok(mut file) => {
                    file.write_all(bytes)
                        .await
                        .map_err(|e| write_error(&path, e))?;
                    file.flush().await.map_err(|e| write_error(&path, e))?;
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(write_error(&path, e)),
            }
        }
    }
}

/// `<stem>_<ext>-<index>.png`, plus `-<attempt>` once the plain name is taken.
///
/// The source extension stays in the name so `a.png` and `a.jpg` never
/// share an output.
fn output_name(source: Option<&Path>, index: usize, attempt: usize) -> String {
    let stem = source
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let base = match source.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_{ext}-{index}"),
        None => format!("{stem}-{index}"),
    };
    if attempt == 0 {
        format!("{base}.png")
    } else {
        format!("{base}-{attempt}.png")
    }
}

fn write_error(path: &Path, e: std::io::Error) -> PipelineError {
    PipelineError::Generation {
        message: format!("Failed to write {}: {e}", path.display()),
        status_code: None,
    }
}

#[async_trait]
impl ImageGenerator for Img2ImgClient {
    fn name(&self) -> &str {
        "img2img"
    }

    async fn process(&self, request: &GenerationRequest) -> PipelineResult<Processed> {
        let response = with_retry(self.retry, "img2img", || self.post_once(request)).await?;
        let images = self.save_images(request, &response.images).await?;
        tracing::debug!("img2img wrote {} image(s)", images.len());
        Ok(Processed {
            images,
            info: response.info,
        })
    }
}
