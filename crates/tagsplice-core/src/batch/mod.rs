//! Batch processing: one img2img call per input image.
//!
//! - **discovery**: find input images
//! - **context**: per-batch prompt state and options
//! - **interrupt**: host job-interruption signal
//! - **runner**: the interrogate → filter → compose → generate loop

pub mod context;
pub mod discovery;
pub mod interrupt;
pub mod runner;

pub use context::{BatchContext, PromptPlan};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use interrupt::Interrupt;
pub use runner::{BatchEvent, BatchRunner, ImageOutcome};
