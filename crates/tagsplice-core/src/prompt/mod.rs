//! Prompt composition: tag aggregation, filtering, and splicing.
//!
//! - **attention**: strip the host's `(text:weight)` decoration for comparison
//! - **filter**: drop tags that already appear in an exclusion tag string
//! - **aggregate**: join per-model outputs in selection order
//! - **compose**: splice the tag string into the user's prompt

pub mod aggregate;
pub mod attention;
pub mod compose;
pub mod filter;

pub use aggregate::aggregate;
pub use attention::strip_attention;
pub use compose::{compose, compose_with, ComposeOptions, TagPosition};
pub use filter::{apply_filters, filter_tags, FilterOptions};
