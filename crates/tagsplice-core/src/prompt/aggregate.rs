//! Joining the outputs of several interrogators.

/// Concatenate per-model tag strings in selection order.
///
/// Empty (or whitespace-only) outputs contribute nothing, so there is never
/// a leading, trailing, or doubled separator.
pub fn aggregate<S: AsRef<str>>(outputs: &[S]) -> String {
    outputs
        .iter()
        .map(|o| o.as_ref().trim())
        .filter(|o| !o.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
