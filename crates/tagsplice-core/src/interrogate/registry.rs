//! Startup registry of interrogator backends.

use std::time::Duration;

use super::caption::CaptionInterrogator;
use super::host::HostInterrogator;
use super::provider::{Interrogator, ModelSelection};
use super::retry::RetryPolicy;
use super::tagger::TaggerInterrogator;
use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};

/// The set of backends a batch may use, in registration order.
#[derive(Default)]
pub struct InterrogatorRegistry {
    backends: Vec<Box<dyn Interrogator>>,
}

impl InterrogatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every backend enabled in the config.
    pub fn from_config(config: &Config) -> Self {
        let timeout = Duration::from_millis(config.limits.interrogate_timeout_ms);
        let retry = RetryPolicy::from(&config.pipeline);

        let mut registry = Self::new();
        if config.host.enabled {
            registry.register(Box::new(HostInterrogator::new(&config.host, timeout, retry)));
        }
        if config.tagger.enabled {
            registry.register(Box::new(TaggerInterrogator::new(
                &config.tagger,
                timeout,
                retry,
            )));
        }
        if config.caption.enabled {
            registry.register(Box::new(CaptionInterrogator::new(&config.caption)));
        }

        tracing::debug!("Registered interrogators: {:?}", registry.names());
        registry
    }

    /// Add a backend. A later backend with the same name replaces the
    /// earlier one.
    pub fn register(&mut self, backend: Box<dyn Interrogator>) {
        self.backends.retain(|b| b.name() != backend.name());
        self.backends.push(backend);
    }

    /// Look up a backend by name.
    pub fn get(&self, name: &str) -> Option<&dyn Interrogator> {
        self.backends
            .iter()
            .find(|b| b.name() == name)
            .map(|b| b.as_ref())
    }

    /// Registered backend names.
    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Iterate over registered backends.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Interrogator> {
        self.backends.iter().map(|b| b.as_ref())
    }

    /// Check every selection names a registered backend and fill in default
    /// models. Order is preserved.
    pub fn resolve(&self, selections: &[ModelSelection]) -> PipelineResult<Vec<ModelSelection>> {
        selections
            .iter()
            .map(|selection| {
                let backend = self
                    .get(&selection.backend)
                    .ok_or_else(|| PipelineError::UnknownBackend(selection.backend.clone()))?;
                Ok(ModelSelection {
                    backend: selection.backend.clone(),
                    model: Some(
                        selection
                            .model
                            .clone()
                            .unwrap_or_else(|| backend.default_model().to_string()),
                    ),
                })
            })
            .collect()
    }
}
