//! Splitting an order utterance into per-item clauses.
//!
//! Two input conventions are supported:
//!
//! - **Spoken/free text** ([`segment`]): `"<clause> also <clause> also ..."`. A
//!   clause may start with a digit quantity. This mode never fails.
//! - **Delimited** ([`segment_delimited`]): `"<n> <name>; <n> <name>"`. Every
//!   segment must carry an explicit quantity or the whole input is rejected.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::whitespace::{collapse_whitespace, tokens};
use crate::{CanonicalError, ClauseSet, QuantityTextPolicy, SegmentConfig};

static DELIMITED_SEGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^([0-9]+)\s+(.+)$").expect("delimited segment pattern is a fixed, valid regex")
});

/// Segment free-form order text on the configured delimiter token.
///
/// Clauses whose matchable text is identical are merged by summing their
/// quantities; the merged clause stays where its text first appeared.
///
/// ```rust
/// use canonical::{segment, SegmentConfig};
///
/// let clauses = segment("2 burgers also a coke also 2 burgers", &SegmentConfig::default());
/// assert_eq!(clauses.quantity_of("2 burgers"), Some(4));
/// assert_eq!(clauses.quantity_of("a coke"), Some(1));
/// ```
pub fn segment(order_text: &str, config: &SegmentConfig) -> ClauseSet {
    let mut out = ClauseSet::new();
    let mut current: Vec<&str> = Vec::new();

    for token in tokens(order_text) {
        if is_delimiter(token, &config.delimiter) {
            push_clause(&mut out, &current, config.quantity_text);
            current.clear();
        } else {
            current.push(token);
        }
    }
    push_clause(&mut out, &current, config.quantity_text);

    out
}

/// Transcripts punctuate around the delimiter (`"burgers, also, a coke."`),
/// so edge punctuation on the token is ignored.
fn is_delimiter(token: &str, delimiter: &str) -> bool {
    token
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .eq_ignore_ascii_case(delimiter)
}

fn push_clause(out: &mut ClauseSet, words: &[&str], policy: QuantityTextPolicy) {
    let Some((&first, rest)) = words.split_first() else {
        return;
    };

    let quantity = leading_quantity(first);
    let text = match (quantity, policy) {
        (Some(_), QuantityTextPolicy::StripLeadingNumber) if !rest.is_empty() => rest.join(" "),
        _ => words.join(" "),
    };

    match quantity {
        Some(0) => debug!(clause = %text, "dropping zero-quantity clause"),
        Some(q) => out.add(text, q),
        None => out.add(text, 1),
    }
}

/// A token counts as a quantity when it is all ASCII digits and fits in `u32`.
fn leading_quantity(token: &str) -> Option<u32> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse::<u32>().ok()
}

/// Segment `;`-delimited text where every segment is `<integer> <name>`.
///
/// The quantity is not part of the clause text. A name that appears twice keeps
/// the quantity of its last occurrence. Any segment that does not fit the shape,
/// including an empty trailing one, fails the whole call.
///
/// ```rust
/// use canonical::{segment_delimited, CanonicalError};
///
/// let clauses = segment_delimited("2 burgers; 1 coke").unwrap();
/// assert_eq!(clauses.quantity_of("burgers"), Some(2));
///
/// assert_eq!(
///     segment_delimited("2 burgers; coke"),
///     Err(CanonicalError::MalformedClause("coke".into()))
/// );
/// ```
pub fn segment_delimited(text: &str) -> Result<ClauseSet, CanonicalError> {
    let mut out = ClauseSet::new();

    for part in text.split(';') {
        let part = part.trim();
        let malformed = || CanonicalError::MalformedClause(part.to_string());

        let caps = DELIMITED_SEGMENT_RE.captures(part).ok_or_else(malformed)?;
        let quantity = caps[1].parse::<u32>().map_err(|_| malformed())?;
        let name = collapse_whitespace(&caps[2]);
        if quantity == 0 || name.is_empty() {
            return Err(malformed());
        }
        out.replace(name, quantity);
    }

    Ok(out)
}
