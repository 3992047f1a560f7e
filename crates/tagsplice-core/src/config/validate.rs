//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::interrogate::{ModelSelection, KNOWN_BACKENDS};
use crate::output::OutputFormat;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.compose.weight) {
            return Err(ConfigError::ValidationError(
                "compose.weight must be between 0.0 and 1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.tagger.threshold) {
            return Err(ConfigError::ValidationError(
                "tagger.threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.limits.interrogate_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.interrogate_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.generate_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.generate_timeout_ms must be > 0".into(),
            ));
        }
        if self.caption.extension.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "caption.extension must not be empty".into(),
            ));
        }
        if OutputFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be \"json\" or \"jsonl\", got {:?}",
                self.output.format
            )));
        }
        for entry in &self.interrogation.models {
            let selection = ModelSelection::parse(entry).ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "interrogation.models entry {entry:?} is not `backend` or `backend:model`"
                ))
            })?;
            if !KNOWN_BACKENDS.contains(&selection.backend.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "interrogation.models entry {entry:?} names unknown backend {:?} (expected one of: {})",
                    selection.backend,
                    KNOWN_BACKENDS.join(", ")
                )));
            }
        }
        Ok(())
    }
}
