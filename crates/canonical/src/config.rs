//! Configuration for the order-text segmenter.
//!
//! ```rust
//! use canonical::{QuantityTextPolicy, SegmentConfig};
//!
//! let config = SegmentConfig::default();
//! assert_eq!(config.delimiter, "also");
//! assert_eq!(config.quantity_text, QuantityTextPolicy::KeepLeadingNumber);
//! ```

use serde::{Deserialize, Serialize};

use crate::CanonicalError;

/// What a clause's matchable text looks like when the clause starts with a number.
///
/// Given the clause `"2 burgers"`:
///
/// ```text
/// KeepLeadingNumber  -> quantity 2, text "2 burgers"
/// StripLeadingNumber -> quantity 2, text "burgers"
/// ```
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuantityTextPolicy {
    /// The number stays part of the text that gets embedded. This is the
    /// behavior deployed catalogs were tuned against.
    #[default]
    KeepLeadingNumber,
    /// The number is removed. A clause consisting only of a number keeps it.
    StripLeadingNumber,
}

/// Segmenter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SegmentConfig {
    /// Clause boundary. Matched as a whole whitespace-separated token,
    /// ignoring ASCII case and any punctuation at the token's edges.
    pub delimiter: String,
    pub quantity_text: QuantityTextPolicy,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            delimiter: "also".into(),
            quantity_text: QuantityTextPolicy::default(),
        }
    }
}

impl SegmentConfig {
    /// The delimiter must be a single non-empty token.
    pub fn validate(&self) -> Result<(), CanonicalError> {
        if self.delimiter.is_empty() {
            return Err(CanonicalError::InvalidConfig(
                "delimiter must not be empty".into(),
            ));
        }
        if self.delimiter.chars().any(char::is_whitespace) {
            return Err(CanonicalError::InvalidConfig(format!(
                "delimiter {:?} must be a single token",
                self.delimiter
            )));
        }
        Ok(())
    }
}
