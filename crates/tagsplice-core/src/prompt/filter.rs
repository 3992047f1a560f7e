//! Tag-set filtering.
//!
//! Removes candidate tags whose stripped form appears in an exclusion tag
//! string. Used against the user's prompt (duplicates), the negative prompt,
//! and a saved custom filter.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::attention::strip_attention;

/// Which exclusion sources to apply to the aggregated tag string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Drop tags already present in the prompt
    pub remove_prompt_tags: bool,

    /// Drop tags present in the negative prompt
    pub remove_negative_tags: bool,

    /// Drop tags present in `custom_filter`
    pub use_custom_filter: bool,

    /// Comma-separated custom exclusion list
    pub custom_filter: String,
}

/// Remove from `candidate` every tag that also appears in `exclusion`.
///
/// Both sides are compared after [`strip_attention`]; surviving candidates
/// keep their original spelling and order. A missing exclusion string is an
/// empty set, so the result is just the candidate with whitespace and empty
/// entries cleaned up.
pub fn filter_tags(candidate: &str, exclusion: Option<&str>) -> String {
    let excluded: HashSet<String> = exclusion
        .unwrap_or_default()
        .split(',')
        .map(|t| strip_attention(t.trim()))
        .filter(|t| !t.is_empty())
        .collect();

    candidate
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter(|t| !excluded.contains(&strip_attention(t)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Apply every enabled filter in order: prompt, negative prompt, custom.
pub fn apply_filters(
    tags: &str,
    prompt: &str,
    negative_prompt: &str,
    options: &FilterOptions,
) -> String {
    let mut filtered = filter_tags(tags, None);

    if options.remove_prompt_tags {
        filtered = filter_tags(&filtered, Some(prompt));
    }
    if options.remove_negative_tags {
        filtered = filter_tags(&filtered, Some(negative_prompt));
    }
    if options.use_custom_filter {
        filtered = filter_tags(&filtered, Some(&options.custom_filter));
    }

    tracing::trace!("Filtered tags: {:?} -> {:?}", tags, filtered);
    filtered
}
