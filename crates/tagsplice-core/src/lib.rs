//! tagsplice core - interrogate images, splice the tags into a prompt, and
//! run img2img.
//!
//! For every input image the selected interrogation models run in order,
//! their tag strings are joined, filtered against the prompt, the negative
//! prompt and a saved custom filter, then spliced into the base prompt
//! (optionally wrapped in an attention weight) for one img2img call.
//!
//! ```text
//! Image → Interrogate (per model) → Aggregate → Filter → Compose → img2img
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use tagsplice_core::{Config, TagSplice};
//! use tagsplice_core::batch::BatchRunner;
//! use tagsplice_core::generate::DryRun;
//!
//! #[tokio::main]
//! async fn main() -> tagsplice_core::Result<()> {
//!     let splice = TagSplice::new(Config::load()?);
//!     let mut ctx = splice.context("forest", "lowres", &["tagger:wd14-vit-v2-git"])?;
//!     let files = splice.discover("./inputs".as_ref())?;
//!
//!     let runner = BatchRunner::new(splice.registry(), &DryRun);
//!     let summary = runner.run(&mut ctx, &files, |_| {}).await;
//!     println!("{} images", summary.succeeded);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod generate;
pub mod interrogate;
pub mod output;
pub mod prompt;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, Result, TagSpliceError};
pub use output::{OutputFormat, ReportWriter};
pub use prompt::{aggregate, compose, filter_tags, strip_attention, TagPosition};
pub use store::FilterStore;
pub use types::{BatchRecord, BatchSummary, ModelOutput};

use std::path::Path;

use batch::{BatchContext, DiscoveredFile, FileDiscovery};
use interrogate::{InterrogatorRegistry, ModelSelection};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config plus the services built from it.
pub struct TagSplice {
    config: Config,
    registry: InterrogatorRegistry,
    store: FilterStore,
}

impl TagSplice {
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing tagsplice v{}", VERSION);
        let registry = InterrogatorRegistry::from_config(&config);
        let store = FilterStore::new(config.custom_filter_path());
        Self {
            config,
            registry,
            store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &InterrogatorRegistry {
        &self.registry
    }

    pub fn filter_store(&self) -> &FilterStore {
        &self.store
    }

    /// Find input images using `[processing]` settings.
    pub fn discover(&self, path: &Path) -> PipelineResult<Vec<DiscoveredFile>> {
        FileDiscovery::new(self.config.processing.clone()).discover(path)
    }

    /// Parse and resolve model selections. An empty list falls back to
    /// `[interrogation].models`.
    pub fn selections<S: AsRef<str>>(&self, models: &[S]) -> Result<Vec<ModelSelection>> {
        let parsed: Vec<ModelSelection> = if models.is_empty() {
            parse_selections(&self.config.interrogation.models)?
        } else {
            parse_selections(models)?
        };
        Ok(self.registry.resolve(&parsed)?)
    }

    /// Build a batch context from config defaults, loading the saved custom
    /// filter when `[filter].use_saved_filter` is set.
    pub fn context<S: AsRef<str>>(
        &self,
        prompt: &str,
        negative_prompt: &str,
        models: &[S],
    ) -> Result<BatchContext> {
        let selections = self.selections(models)?;
        let mut ctx = BatchContext::from_config(&self.config, prompt, negative_prompt, selections);
        if ctx.filter.use_custom_filter {
            ctx.filter.custom_filter = self.store.load()?;
        }
        Ok(ctx)
    }
}

fn parse_selections<S: AsRef<str>>(models: &[S]) -> Result<Vec<ModelSelection>> {
    models
        .iter()
        .map(|m| {
            ModelSelection::parse(m.as_ref()).ok_or_else(|| {
                TagSpliceError::from(ConfigError::ValidationError(format!(
                    "invalid model selection '{}', expected backend or backend:model",
                    m.as_ref()
                )))
            })
        })
        .collect()
}
