//! Configuration management for tagsplice.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a missing file or a
//! partial file both work.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use crate::prompt::ComposeOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for tagsplice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Input discovery settings
    pub processing: ProcessingConfig,

    /// Interrogator selection
    pub interrogation: InterrogationConfig,

    /// Tag placement and weighting
    pub compose: ComposeOptions,

    /// Tag exclusion filters
    pub filter: FilterConfig,

    /// Built-in web UI interrogators
    pub host: HostConfig,

    /// Tagger extension backend
    pub tagger: TaggerConfig,

    /// Sidecar caption files
    pub caption: CaptionConfig,

    /// img2img settings
    pub generation: GenerationConfig,

    /// Timeouts
    pub limits: LimitsConfig,

    /// Retry settings
    pub pipeline: PipelineConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.tagsplice.tagsplice/config.toml
    /// - Linux: ~/.config/tagsplice/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\tagsplice\config\config.toml
    ///
    /// Falls back to ~/.tagsplice/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "tagsplice", "tagsplice")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".tagsplice").join("config.toml")
            })
    }

    /// Get the resolved custom filter file path (with ~ expansion).
    pub fn custom_filter_path(&self) -> PathBuf {
        match &self.general.custom_filter_path {
            Some(path) => expand(&path.to_string_lossy()),
            None => {
                let config_path = Self::default_path();
                config_path
                    .parent()
                    .unwrap_or(&config_path)
                    .join("custom_filter.txt")
            }
        }
    }

    /// Get the resolved img2img output directory (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        expand(&self.generation.output_dir)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
