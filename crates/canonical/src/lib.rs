//! menumatch canonical text layer.
//!
//! Turns a raw order utterance into clauses the resolver can work on, one per
//! ordered item, each with a quantity.
//!
//! ## What we do
//!
//! - Number-word normalization for transcribed speech ("two" → "2")
//! - Segmentation on a delimiter token (`"also"` by default) with leading
//!   digit quantities
//! - A strict `;`-delimited alternative for typed input
//! - Merging of clauses with identical text
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no locale dependence. Same text and config, same
//! clauses, in the same order.
//!
//! ```rust
//! use canonical::{normalize_number_words, segment, SegmentConfig};
//!
//! let text = normalize_number_words("two burgers also a coke no ice");
//! let clauses = segment(&text, &SegmentConfig::default());
//! let pairs: Vec<(&str, u32)> = clauses.iter().collect();
//! assert_eq!(pairs, vec![("2 burgers", 2), ("a coke no ice", 1)]);
//! ```

mod clause;
mod config;
mod error;
mod numbers;
mod segment;
mod whitespace;

pub use crate::clause::{ClauseSet, OrderClause};
pub use crate::config::{QuantityTextPolicy, SegmentConfig};
pub use crate::error::CanonicalError;
pub use crate::numbers::normalize_number_words;
pub use crate::segment::{segment, segment_delimited};
pub use crate::whitespace::collapse_whitespace;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spoken_order_round_trip() {
        let text = normalize_number_words("Three fries also one shake also three fries");
        let clauses = segment(&text, &SegmentConfig::default());
        assert_eq!(clauses.quantity_of("3 fries"), Some(6));
        assert_eq!(clauses.quantity_of("1 shake"), Some(1));
        assert_eq!(clauses.len(), 2);
    }

    #[test]
    fn segment_is_deterministic() {
        let cfg = SegmentConfig::default();
        let input = "a burger also 2 cokes also fries also a burger";
        assert_eq!(segment(input, &cfg), segment(input, &cfg));
    }

    #[test]
    fn clause_set_into_iter_preserves_order() {
        let clauses: Vec<OrderClause> = segment("b also a also c", &SegmentConfig::default())
            .into_iter()
            .collect();
        let texts: Vec<&str> = clauses.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "a", "c"]);
    }
}
