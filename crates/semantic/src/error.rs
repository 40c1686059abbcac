use thiserror::Error;

/// Errors surfaced by embedding providers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SemanticError {
    /// Configuration is inconsistent (e.g., `api` mode without an `api_url`).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// The provider could not be reached or answered with a non-success status.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// The provider answered, but the payload could not be turned into a vector.
    #[error("malformed provider output: {0}")]
    Malformed(String),
    /// The vector does not have the dimension the caller expects.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// The provider did not answer within the caller's deadline.
    #[error("provider timed out after {0} ms")]
    Timeout(u64),
}

impl SemanticError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SemanticError::Unavailable(_) | SemanticError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_config() {
        let err = SemanticError::InvalidConfig("missing api_url".into());
        assert!(err.to_string().contains("invalid semantic config"));
        assert!(err.to_string().contains("missing api_url"));
    }

    #[test]
    fn error_dimension_mismatch_mentions_both_sizes() {
        let err = SemanticError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        let msg = err.to_string();
        assert!(msg.contains("384"));
        assert!(msg.contains("768"));
    }

    #[test]
    fn transient_classification() {
        assert!(SemanticError::Unavailable("HTTP 503".into()).is_transient());
        assert!(SemanticError::Timeout(250).is_transient());
        assert!(!SemanticError::Malformed("not an array".into()).is_transient());
        assert!(!SemanticError::InvalidConfig("x".into()).is_transient());
    }

    #[test]
    fn error_debug_formatting() {
        let err = SemanticError::Malformed("bad".into());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Malformed"));
    }
}
