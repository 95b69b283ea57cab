//! UTF-8-safe string helpers for display and counting

/// Truncate a string to at most `max_chars` characters (not bytes).
///
/// Never splits a multi-byte character.
///
/// # Examples
/// ```
/// # use declutter::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("Hello, World!", 5), "Hello");
/// assert_eq!(safe_truncate_chars("日本語のテキスト", 3), "日本語");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Shorten `s` for a one-line status message, marking the cut with `…`
#[must_use]
pub fn ellipsize(s: &str, max_chars: usize) -> String {
    let truncated = safe_truncate_chars(s, max_chars.saturating_sub(1));
    if truncated.len() == s.len() {
        s.to_string()
    } else {
        format!("{truncated}…")
    }
}

/// Number of whitespace-separated words
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Collapse runs of whitespace into single spaces and trim the ends
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
