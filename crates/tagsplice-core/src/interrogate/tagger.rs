//! WD14-style tagger extension backend.
//!
//! The tagger returns a confidence per tag (plus rating scores, which are
//! ignored). Tags at or above the threshold are flattened into a
//! comma-separated string, most confident first.

use super::provider::{ImageInput, Interrogator};
use super::retry::{with_retry, RetryPolicy};
use crate::config::TaggerConfig;
use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Tagger extension backend.
pub struct TaggerInterrogator {
    endpoint: String,
    config: TaggerConfig,
    client: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
}

/// `/tagger/v1/interrogate` request body.
#[derive(Serialize)]
struct TaggerRequest<'a> {
    image: &'a str,
    model: &'a str,
    threshold: f32,
}

/// `/tagger/v1/interrogate` response.
#[derive(Deserialize)]
struct TaggerResponse {
    caption: TaggerCaption,
}

/// Rating scores arrive alongside `tag` and are not used.
#[derive(Deserialize)]
struct TaggerCaption {
    #[serde(default)]
    tag: HashMap<String, f32>,
}

/// `/tagger/v1/interrogators` response.
#[derive(Deserialize)]
struct ModelsResponse {
    models: Vec<String>,
}

impl TaggerInterrogator {
    pub fn new(config: &TaggerConfig, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            config: config.clone(),
            client: reqwest::Client::new(),
            timeout,
            retry,
        }
    }

    async fn interrogate_once(&self, image: &ImageInput, model: &str) -> PipelineResult<String> {
        let url = format!("{}/tagger/v1/interrogate", self.endpoint);
        let body = TaggerRequest {
            image: &image.data,
            model,
            threshold: self.config.threshold,
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.send_error(e, model))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Interrogation {
                backend: "tagger".to_string(),
                model: model.to_string(),
                message: format!("HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let parsed: TaggerResponse = resp.json().await.map_err(|e| {
            PipelineError::interrogation("tagger", model, format!("Failed to parse response: {e}"))
        })?;

        Ok(flatten_tags(&parsed.caption.tag, &self.config))
    }

    fn send_error(&self, e: reqwest::Error, model: &str) -> PipelineError {
        if e.is_timeout() {
            PipelineError::Timeout {
                stage: format!("interrogate tagger:{model}"),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            PipelineError::interrogation("tagger", model, format!("Request failed: {e}"))
        }
    }
}

/// Keep tags at or above the threshold, most confident first, and render
/// them as a prompt-ready string.
fn flatten_tags(tags: &HashMap<String, f32>, config: &TaggerConfig) -> String {
    let mut accepted: Vec<(&String, f32)> = tags
        .iter()
        .filter(|(_, confidence)| **confidence >= config.threshold)
        .map(|(name, confidence)| (name, *confidence))
        .collect();

    // Ties broken by name so output is deterministic
    accepted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    accepted
        .into_iter()
        .map(|(name, _)| {
            let mut tag = name.clone();
            if config.replace_underscores {
                tag = tag.replace('_', " ");
            }
            if config.escape_parentheses {
                tag = tag.replace('(', "\\(").replace(')', "\\)");
            }
            tag
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl Interrogator for TaggerInterrogator {
    fn name(&self) -> &str {
        "tagger"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    async fn available(&self) -> bool {
        let url = format!("{}/tagger/v1/interrogators", self.endpoint);
        match self.client.get(&url).timeout(Duration::from_secs(5)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn models(&self) -> PipelineResult<Vec<String>> {
        let url = format!("{}/tagger/v1/interrogators", self.endpoint);
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.send_error(e, "*"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::Interrogation {
                backend: "tagger".to_string(),
                model: "*".to_string(),
                message: format!("HTTP {status} listing models"),
                status_code: Some(status.as_u16()),
            });
        }

        let parsed: ModelsResponse = resp.json().await.map_err(|e| {
            PipelineError::interrogation("tagger", "*", format!("Failed to parse model list: {e}"))
        })?;
        Ok(parsed.models)
    }

    async fn run(&self, image: &ImageInput, model: &str) -> PipelineResult<String> {
        let label = format!("tagger:{model}");
        with_retry(self.retry, &label, || self.interrogate_once(image, model)).await
    }

    async fn unload(&self) -> PipelineResult<()> {
        let url = format!("{}/tagger/v1/unload-interrogators", self.endpoint);
        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.send_error(e, "*"))?;

        if !resp.status().is_success() {
            return Err(PipelineError::Interrogation {
                backend: "tagger".to_string(),
                model: "*".to_string(),
                message: format!("HTTP {} unloading models", resp.status()),
                status_code: Some(resp.status().as_u16()),
            });
        }
        tracing::debug!("Tagger models unloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn config(endpoint: &str) -> TaggerConfig {
        TaggerConfig {
            endpoint: endpoint.to_string(),
            ..TaggerConfig::default()
        }
    }

    fn tags(pairs: &[(&str, f32)]) -> HashMap<String, f32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_flatten_applies_threshold_and_order() {
        let tags = tags(&[
            ("long_hair", 0.6),
            ("1girl", 0.98),
            ("hat", 0.2),
            ("solo", 0.9),
        ]);
        assert_eq!(
            flatten_tags(&tags, &TaggerConfig::default()),
            "1girl, solo, long hair"
        );
    }

    #[test]
    fn test_flatten_threshold_is_inclusive() {
        let tags = tags(&[("sky", 0.35)]);
        assert_eq!(flatten_tags(&tags, &TaggerConfig::default()), "sky");
    }

    #[test]
    fn test_flatten_escapes_parentheses() {
        let tags = tags(&[("yuri_(artist)", 0.8)]);
        assert_eq!(
            flatten_tags(&tags, &TaggerConfig::default()),
            "yuri \\(artist\\)"
        );

        let raw = TaggerConfig {
            replace_underscores: false,
            escape_parentheses: false,
            ..TaggerConfig::default()
        };
        assert_eq!(flatten_tags(&tags, &raw), "yuri_(artist)");
    }

    #[test]
    fn test_flatten_ties_sorted_by_name() {
        let tags = tags(&[("b", 0.5), ("a", 0.5)]);
        assert_eq!(flatten_tags(&tags, &TaggerConfig::default()), "a, b");
    }

    #[tokio::test]
    async fn test_run_parses_tagger_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tagger/v1/interrogate")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "wd14-convnext"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"caption": {"tag": {"cat": 0.91, "cat_ears": 0.4, "dog": 0.1},
                                "rating": {"general": 0.95}}}"#,
            )
            .create_async()
            .await;

        let interrogator = TaggerInterrogator::new(
            &config(&server.url()),
            Duration::from_secs(5),
            RetryPolicy::none(),
        );
        let image = ImageInput::from_bytes(Path::new("cat.png"), &[0]);
        let result = interrogator.run(&image, "wd14-convnext").await.unwrap();
        assert_eq!(result, "cat, cat ears");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_models_lists_interrogators() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tagger/v1/interrogators")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"models": ["wd14-vit-v2-git", "wd14-convnext"]}"#)
            .create_async()
            .await;

        let interrogator = TaggerInterrogator::new(
            &config(&server.url()),
            Duration::from_secs(5),
            RetryPolicy::none(),
        );
        assert!(interrogator.available().await);
        assert_eq!(
            interrogator.models().await.unwrap(),
            vec!["wd14-vit-v2-git", "wd14-convnext"]
        );
    }

    #[tokio::test]
    async fn test_unload_posts_to_tagger() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tagger/v1/unload-interrogators")
            .with_status(200)
            .create_async()
            .await;

        let interrogator = TaggerInterrogator::new(
            &config(&server.url()),
            Duration::from_secs(5),
            RetryPolicy::none(),
        );
        interrogator.unload().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unavailable_when_unreachable() {
        let interrogator = TaggerInterrogator::new(
            &config("http://127.0.0.1:9"),
            Duration::from_secs(1),
            RetryPolicy::none(),
        );
        assert!(!interrogator.available().await);
    }
}
