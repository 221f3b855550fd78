use crate::error::ViewerError;
use crate::model::TruncationWindow;

/// Spellings of the fill-in-middle suffix token used by the supported tokenizers.
const FIM_SUFFIX_MARKERS: [&str; 2] = ["<fim_suffix>", "<|fim_suffix|>"];

/// Recovers the original code around the completion gap from a templated prompt.
///
/// The prefix is the longest common suffix of `prompt` and the template text before
/// the marker; the suffix is the longest common prefix of `right_context` and the
/// template text after it. Matching is per character, never per token.
pub fn compute_truncation_window(
    prompt: &str,
    templated: &str,
    right_context: &str,
) -> Result<TruncationWindow, ViewerError> {
    let (template_prefix, template_suffix) =
        split_at_marker(templated).ok_or(ViewerError::Format { task_id: None })?;

    Ok(TruncationWindow {
        truncated_prefix: common_suffix(prompt, template_prefix).to_string(),
        truncated_suffix: common_prefix(right_context, template_suffix).to_string(),
    })
}

fn split_at_marker(templated: &str) -> Option<(&str, &str)> {
    FIM_SUFFIX_MARKERS
        .iter()
        .filter_map(|marker| {
            templated
                .find(marker)
                .map(|position| (position, marker.len()))
        })
        .min_by_key(|(position, _)| *position)
        .map(|(position, len)| (&templated[..position], &templated[position + len..]))
}

/// Longest prefix of `text` that `other` also starts with.
fn common_prefix<'a>(text: &'a str, other: &str) -> &'a str {
    let matched: usize = text
        .chars()
        .zip(other.chars())
        .take_while(|(left, right)| left == right)
        .map(|(left, _)| left.len_utf8())
        .sum();
    &text[..matched]
}

/// Longest suffix of `text` that `other` also ends with.
fn common_suffix<'a>(text: &'a str, other: &str) -> &'a str {
    let matched: usize = text
        .chars()
        .rev()
        .zip(other.chars().rev())
        .take_while(|(left, right)| left == right)
        .map(|(left, _)| left.len_utf8())
        .sum();
    &text[text.len() - matched..]
}
