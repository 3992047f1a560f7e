//! Splicing the tag string into the user's prompt.

use serde::{Deserialize, Serialize};

/// Where the generated tags go relative to the user's prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagPosition {
    /// Tags first, then the prompt
    Prepend,
    /// Prompt first, then the tags
    #[default]
    Append,
}

/// Placement and weighting of the tag segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    /// Tag placement
    pub position: TagPosition,

    /// Wrap the tag segment in attention syntax
    pub use_weight: bool,

    /// Attention weight, 0.0 to 1.0
    pub weight: f32,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            position: TagPosition::Append,
            use_weight: true,
            weight: 0.5,
        }
    }
}

/// Build the final prompt from the user's prompt and a tag string.
///
/// An empty prompt yields the tag string verbatim. An empty tag string
/// leaves the prompt untouched.
pub fn compose(
    original_prompt: &str,
    tag_string: &str,
    position: TagPosition,
    use_weight: bool,
    weight: f32,
) -> String {
    if original_prompt.is_empty() {
        return tag_string.to_string();
    }
    if tag_string.trim().is_empty() {
        return original_prompt.to_string();
    }

    let segment = if use_weight {
        format!("({tag_string}:{})", format_weight(weight))
    } else {
        tag_string.to_string()
    };

    match position {
        TagPosition::Prepend => format!("{segment}, {original_prompt}"),
        TagPosition::Append => format!("{original_prompt}, {segment}"),
    }
}

/// Compose with an options struct.
pub fn compose_with(original_prompt: &str, tag_string: &str, options: &ComposeOptions) -> String {
    compose(
        original_prompt,
        tag_string,
        options.position,
        options.use_weight,
        options.weight,
    )
}

/// Render a weight with at least one fractional digit (`1.0`, not `1`).
fn format_weight(weight: f32) -> String {
    if weight.fract() == 0.0 {
        format!("{weight:.1}")
    } else {
        weight.to_string()
    }
}
