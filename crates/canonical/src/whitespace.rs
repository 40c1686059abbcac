//! Whitespace normalization.
//!
//! Uses Unicode's definition of whitespace (`char::is_whitespace`), so tabs,
//! newlines and non-breaking spaces all count as separators.

/// Collapses repeated whitespace, trims edges, and normalizes newlines to
/// single spaces.
///
/// Clause texts go through this before they are embedded or compared, so
/// `"no  pickles"` and `"no pickles"` merge into one clause.
///
/// ```rust
/// use canonical::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  two \t burgers\n"), "two burgers");
/// assert_eq!(collapse_whitespace("   "), "");
/// assert_eq!(collapse_whitespace("a\u{00A0}coke"), "a coke");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for segment in text.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}

/// Split `text` into whitespace-separated tokens.
pub fn tokens(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}
