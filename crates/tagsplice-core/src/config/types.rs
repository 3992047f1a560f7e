//! Sub-configuration structs with defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default web UI address used by every HTTP backend.
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:7860";

/// General settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Saved custom filter file. Defaults to `custom_filter.txt` next to
    /// the config file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_filter_path: Option<PathBuf>,
}

/// Input discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Supported input formats
    pub supported_formats: Vec<String>,

    /// Descend into subdirectories of the input directory
    pub recursive: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "bmp".to_string(),
            ],
            recursive: false,
        }
    }
}

/// Which interrogators run, and in what order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterrogationConfig {
    /// Model selections as `backend:model` (or a bare backend name).
    /// Outputs are joined in this order.
    pub models: Vec<String>,

    /// Ask every used backend to unload its models after the batch
    pub unload_after: bool,
}

impl Default for InterrogationConfig {
    fn default() -> Self {
        Self {
            models: vec!["host:deepdanbooru".to_string()],
            unload_after: false,
        }
    }
}

/// Which exclusion filters are applied to the aggregated tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Drop tags that already appear in the prompt
    pub remove_prompt_tags: bool,

    /// Drop tags that appear in the negative prompt
    pub remove_negative_tags: bool,

    /// Apply the saved custom filter
    pub use_saved_filter: bool,
}

/// The web UI's built-in interrogators (CLIP, DeepDanbooru).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Whether this backend is registered
    pub enabled: bool,

    /// Web UI API endpoint
    pub endpoint: String,

    /// Interrogator names the host exposes
    pub models: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            models: vec!["clip".to_string(), "deepdanbooru".to_string()],
        }
    }
}

/// WD14-style tagger extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Whether this backend is registered
    pub enabled: bool,

    /// Web UI API endpoint hosting the tagger routes
    pub endpoint: String,

    /// Model used when a selection names only the backend
    pub default_model: String,

    /// Minimum confidence for a tag to be kept
    pub threshold: f32,

    /// Replace `_` with spaces in tag names
    pub replace_underscores: bool,

    /// Escape `(` and `)` in tag names so the host does not read them as
    /// attention groups
    pub escape_parentheses: bool,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            default_model: "wd14-vit-v2-git".to_string(),
            threshold: 0.35,
            replace_underscores: true,
            escape_parentheses: true,
        }
    }
}

/// Sidecar caption files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Whether this backend is registered
    pub enabled: bool,

    /// Extension of the caption file next to each image
    pub extension: String,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extension: "txt".to_string(),
        }
    }
}

/// img2img settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Web UI API endpoint
    pub endpoint: String,

    /// Directory for generated images
    pub output_dir: String,

    /// Extra img2img parameters passed through verbatim
    /// (steps, denoising_strength, sampler_name, ...)
    pub params: toml::Table,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let mut params = toml::Table::new();
        params.insert("denoising_strength".to_string(), toml::Value::Float(0.75));
        params.insert("steps".to_string(), toml::Value::Integer(20));

        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            output_dir: "~/tagsplice/outputs".to_string(),
            params,
        }
    }
}

/// Timeouts for external calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Per-call interrogation timeout in milliseconds
    pub interrogate_timeout_ms: u64,

    /// Per-image img2img timeout in milliseconds
    pub generate_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            interrogate_timeout_ms: 60_000,
            generate_timeout_ms: 300_000,
        }
    }
}

/// Retry settings for the HTTP backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max retry attempts for transient failures
    pub retry_attempts: u32,

    /// Base delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            retry_delay_ms: 1000,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
