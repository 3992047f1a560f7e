//! Interrogator backends: services that look at an image and return tags.
//!
//! Every backend implements [`Interrogator`]; the [`InterrogatorRegistry`]
//! builds the enabled ones from config and resolves the user's
//! `backend:model` selections against them.

pub(crate) mod caption;
pub(crate) mod host;
pub(crate) mod provider;
pub(crate) mod registry;
pub(crate) mod retry;
pub(crate) mod tagger;

pub use caption::CaptionInterrogator;
pub use host::HostInterrogator;
pub use provider::{ImageInput, Interrogator, ModelSelection};
pub use registry::InterrogatorRegistry;
pub use retry::RetryPolicy;
pub use tagger::TaggerInterrogator;

/// Backend names accepted in `interrogation.models`.
pub const KNOWN_BACKENDS: &[&str] = &["host", "tagger", "caption"];
