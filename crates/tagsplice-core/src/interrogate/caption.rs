//! Sidecar caption files.
//!
//! Reads tags that were written next to the image beforehand
//! (`photo.png` → `photo.txt`). A missing file means "no tags", not an error.

use super::provider::{ImageInput, Interrogator};
use crate::config::CaptionConfig;
use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const MODEL: &str = "sidecar";

/// Caption-file backend.
pub struct CaptionInterrogator {
    extension: String,
}

impl CaptionInterrogator {
    pub fn new(config: &CaptionConfig) -> Self {
        Self {
            extension: config.extension.trim_start_matches('.').to_string(),
        }
    }

    /// Path of the caption file belonging to `image`.
    pub fn caption_path(&self, image: &Path) -> PathBuf {
        image.with_extension(&self.extension)
    }
}

#[async_trait]
impl Interrogator for CaptionInterrogator {
    fn name(&self) -> &str {
        "caption"
    }

    fn default_model(&self) -> &str {
        MODEL
    }

    async fn available(&self) -> bool {
        true
    }

    async fn models(&self) -> PipelineResult<Vec<String>> {
        Ok(vec![MODEL.to_string()])
    }

    async fn run(&self, image: &ImageInput, model: &str) -> PipelineResult<String> {
        let path = self.caption_path(&image.path);
        if !path.exists() {
            tracing::debug!("No caption file at {:?}", path);
            return Ok(String::new());
        }

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            PipelineError::interrogation(
                "caption",
                model,
                format!("Failed to read {}: {e}", path.display()),
            )
        })?;

        // Multi-line captions become one tag string
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interrogator() -> CaptionInterrogator {
        CaptionInterrogator::new(&CaptionConfig::default())
    }

    #[tokio::test]
    async fn test_reads_sidecar_file() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("cat.png");
        std::fs::write(&image_path, [0u8; 4]).unwrap();
        std::fs::write(dir.path().join("cat.txt"), "cat, whiskers\n\nsitting\n").unwrap();

        let image = ImageInput::load(&image_path).await.unwrap();
        let tags = interrogator().run(&image, MODEL).await.unwrap();
        assert_eq!(tags, "cat, whiskers, sitting");
    }

    #[tokio::test]
    async fn test_missing_sidecar_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let image = ImageInput::from_bytes(&dir.path().join("dog.png"), &[0]);
        let tags = interrogator().run(&image, MODEL).await.unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn test_caption_path_custom_extension() {
        let interrogator = CaptionInterrogator::new(&CaptionConfig {
            enabled: true,
            extension: ".caption".to_string(),
        });
        assert_eq!(
            interrogator.caption_path(Path::new("/data/a.jpg")),
            PathBuf::from("/data/a.caption")
        );
    }
}
