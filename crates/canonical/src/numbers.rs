//! Number-word normalization for speech-derived text.
//!
//! Transcribers tend to spell small numbers out ("two burgers"), while the
//! segmenter only recognizes digit quantities. This rewrites the words zero
//! through ten into digits and leaves everything else alone.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const NUMBER_WORDS: [(&str, &str); 11] = [
    ("zero", "0"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("ten", "10"),
];

static NUMBER_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    let alternatives: Vec<&str> = NUMBER_WORDS.iter().map(|(word, _)| *word).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
        .expect("number word pattern is a fixed, valid regex")
});

/// Replace whole-word occurrences of "zero".."ten" (any case) with digits.
///
/// ```rust
/// use canonical::normalize_number_words;
///
/// assert_eq!(normalize_number_words("Two burgers also one coke"), "2 burgers also 1 coke");
/// assert_eq!(normalize_number_words("someone often"), "someone often");
/// ```
pub fn normalize_number_words(text: &str) -> String {
    NUMBER_WORD_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let word = caps[0].to_ascii_lowercase();
            NUMBER_WORDS
                .iter()
                .find(|(w, _)| *w == word)
                .map(|(_, digit)| (*digit).to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
