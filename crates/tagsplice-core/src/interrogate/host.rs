//! The web UI's built-in interrogators (CLIP captioning, DeepDanbooru).
//!
//! Talks to the host's `/sdapi/v1/interrogate` route. The host loads and
//! unloads these models itself, so `unload` is a no-op here.

use super::provider::{ImageInput, Interrogator};
use super::retry::{with_retry, RetryPolicy};
use crate::config::HostConfig;
use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Built-in host interrogators.
pub struct HostInterrogator {
    endpoint: String,
    models: Vec<String>,
    client: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HostInterrogator {
    pub fn new(config: &HostConfig, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            models: config.models.clone(),
            client: reqwest::Client::new(),
            timeout,
            retry,
        }
    }

    async fn interrogate_once(&self, image: &ImageInput, model: &str) -> PipelineResult<String> {
        let url = format!("{}/sdapi/v1/interrogate", self.endpoint);
        let body = InterrogateRequest {
            image: &image.data,
            model,
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| send_error(e, model, self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Interrogation {
                backend: "host".to_string(),
                model: model.to_string(),
                message: format!("HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let parsed: InterrogateResponse = resp.json().await.map_err(|e| {
            PipelineError::interrogation("host", model, format!("Failed to parse response: {e}"))
        })?;

        Ok(parsed.caption.trim().to_string())
    }
}

/// `/sdapi/v1/interrogate` request body.
#[derive(Serialize)]
struct InterrogateRequest<'a> {
    image: &'a str,
    model: &'a str,
}

/// `/sdapi/v1/interrogate` response.
#[derive(Deserialize)]
struct InterrogateResponse {
    #[serde(default)]
    caption: String,
}

fn send_error(e: reqwest::Error, model: &str, timeout: Duration) -> PipelineError {
    if e.is_timeout() {
        PipelineError::Timeout {
            stage: format!("interrogate host:{model}"),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        PipelineError::interrogation("host", model, format!("Request failed: {e}"))
    }
}

#[async_trait]
impl Interrogator for HostInterrogator {
    fn name(&self) -> &str {
        "host"
    }

    fn default_model(&self) -> &str {
        self.models.first().map(String::as_str).unwrap_or("clip")
    }

    async fn available(&self) -> bool {
        let url = format!("{}/internal/ping", self.endpoint);
        match self.client.get(&url).timeout(Duration::from_secs(5)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn models(&self) -> PipelineResult<Vec<String>> {
        Ok(self.models.clone())
    }

    async fn run(&self, image: &ImageInput, model: &str) -> PipelineResult<String> {
        let label = format!("host:{model}");
        with_retry(self.retry, &label, || self.interrogate_once(image, model)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn interrogator(endpoint: &str) -> HostInterrogator {
        let config = HostConfig {
            enabled: true,
            endpoint: format!("{endpoint}/"),
            models: vec!["clip".to_string(), "deepdanbooru".to_string()],
        };
        HostInterrogator::new(&config, Duration::from_secs(5), RetryPolicy::none())
    }

    fn image() -> ImageInput {
        ImageInput::from_bytes(Path::new("cat.png"), &[1, 2, 3])
    }

    #[tokio::test]
    async fn test_run_returns_trimmed_caption() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/sdapi/v1/interrogate")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "deepdanbooru"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"caption": " 1girl, solo, long hair \n"}"#)
            .create_async()
            .await;

        let result = interrogator(&server.url())
            .run(&image(), "deepdanbooru")
            .await
            .unwrap();
        assert_eq!(result, "1girl, solo, long hair");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_run_reports_http_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/sdapi/v1/interrogate")
            .with_status(404)
            .with_body("Model not found")
            .create_async()
            .await;

        let err = interrogator(&server.url())
            .run(&image(), "blip")
            .await
            .unwrap_err();
        match err {
            PipelineError::Interrogation {
                status_code, model, ..
            } => {
                assert_eq!(status_code, Some(404));
                assert_eq!(model, "blip");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", "/sdapi/v1/interrogate")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let config = HostConfig {
            endpoint: server.url(),
            ..HostConfig::default()
        };
        let interrogator = HostInterrogator::new(
            &config,
            Duration::from_secs(5),
            RetryPolicy {
                attempts: 2,
                delay_ms: 1,
            },
        );
        assert!(interrogator.run(&image(), "clip").await.is_err());
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_default_model_is_first_configured() {
        let interrogator = interrogator("http://127.0.0.1:9");
        assert_eq!(interrogator.default_model(), "clip");
        assert_eq!(
            interrogator.models().await.unwrap(),
            vec!["clip", "deepdanbooru"]
        );
    }
}
