use thiserror::Error;

/// Errors that can occur while segmenting order text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A `;`-delimited segment was not of the form `<integer> <name>`.
    #[error("malformed clause: {0:?}")]
    MalformedClause(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_clause_quotes_segment() {
        let err = CanonicalError::MalformedClause("burger".into());
        assert_eq!(err.to_string(), "malformed clause: \"burger\"");
    }
}
