//! Attention-syntax stripping.
//!
//! The host weights prompt segments with `(text:1.2)`. Two tags that differ
//! only by that decoration must compare equal, so filtering works on the
//! stripped form. The stripped form is never shown to the user.

use regex::Regex;
use std::sync::LazyLock;

/// Weight suffix such as `:1` or `:0.75`, anywhere in the token.
static WEIGHT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\d+(\.\d+)?").expect("weight suffix pattern is valid"));

// Private-use code points: they cannot appear in a typed prompt.
const OPEN_PLACEHOLDER: &str = "\u{E000}";
const CLOSE_PLACEHOLDER: &str = "\u{E001}";

/// Strip attention decoration from a single tag token.
///
/// Removes weight suffixes and grouping parentheses while keeping escaped
/// parentheses (`\(`, `\)`) intact. Never fails; malformed nesting is just
/// text.
pub fn strip_attention(token: &str) -> String {
    let unweighted = WEIGHT_SUFFIX.replace_all(token, "");
    unweighted
        .replace("\\(", OPEN_PLACEHOLDER)
        .replace("\\)", CLOSE_PLACEHOLDER)
        .replace(['(', ')'], "")
        .replace(OPEN_PLACEHOLDER, "\\(")
        .replace(CLOSE_PLACEHOLDER, "\\)")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_weighted_group() {
        assert_eq!(strip_attention("(tag:0.5)"), "tag");
    }

    #[test]
    fn test_keeps_escaped_parens() {
        assert_eq!(strip_attention("\\(tag\\)"), "\\(tag\\)");
    }

    #[test]
    fn test_strips_nested_emphasis() {
        assert_eq!(strip_attention("((red hair))"), "red hair");
    }

    #[test]
    fn test_integer_weight() {
        assert_eq!(strip_attention("(sky:2)"), "sky");
    }

    #[test]
    fn test_weight_inside_escaped_name() {
        assert_eq!(
            strip_attention("(yuri \\(artist\\):1.3)"),
            "yuri \\(artist\\)"
        );
    }

    #[test]
    fn test_unbalanced_parens_do_not_fail() {
        assert_eq!(strip_attention("((cat"), "cat");
        assert_eq!(strip_attention("cat))"), "cat");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(strip_attention(""), "");
        assert_eq!(strip_attention("   "), "");
    }

    #[test]
    fn test_plain_tag_is_trimmed_only() {
        assert_eq!(strip_attention("  1girl "), "1girl");
    }

    #[test]
    fn test_colon_without_number_is_kept() {
        assert_eq!(strip_attention("ratio:wide"), "ratio:wide");
    }
}
