//! Context snippets around a match.

/// Default number of context characters on each side of a match.
pub const DEFAULT_SNIPPET_CHARS: usize = 150;

const ELLIPSIS: &str = "...";

/// Extract a single-line excerpt around the character span `start..end`.
///
/// Takes up to `context` characters before `start` and after `end`,
/// collapses every whitespace run to one space, and marks clipped edges
/// with `...`.
///
/// # Panics
///
/// Panics if `start > end` or `end` exceeds the character length of
/// `text`. Offsets come from the matcher; anything else is a caller bug.
pub fn extract_snippet(text: &str, start: usize, end: usize, context: usize) -> String {
    let total = text.chars().count();
    assert!(
        start <= end && end <= total,
        "snippet span {}..{} out of range for text of {} chars",
        start,
        end,
        total
    );

    let window_start = start.saturating_sub(context);
    let window_end = end.saturating_add(context).min(total);

    let mut snippet = String::with_capacity(window_end - window_start + 2 * ELLIPSIS.len());
    if window_start > 0 {
        snippet.push_str(ELLIPSIS);
    }

    let mut in_space = false;
    for c in text.chars().skip(window_start).take(window_end - window_start) {
        if c.is_whitespace() {
            if !in_space {
                snippet.push(' ');
                in_space = true;
            }
        } else {
            snippet.push(c);
            in_space = false;
        }
    }

    if window_end < total {
        snippet.push_str(ELLIPSIS);
    }

    snippet.trim().to_string()
}
