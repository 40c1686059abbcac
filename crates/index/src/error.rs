use bincode::error::{DecodeError, EncodeError};
use semantic::SemanticError;
use thiserror::Error;

/// Errors from building, validating or persisting a catalog index.
#[derive(Error, Debug, Clone)]
pub enum IndexError {
    /// The provider failed on one entry; no index was produced.
    #[error("index build failed while embedding {key:?}: {source}")]
    Build {
        key: String,
        #[source]
        source: SemanticError,
    },
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Serialization encode error: {0}")]
    Encode(String),
    #[error("Serialization decode error: {0}")]
    Decode(String),
    #[error("Compression error: {0}")]
    Compression(String),
    /// Stored data is inconsistent with its own manifest.
    #[error("corrupt catalog store: {0}")]
    Corrupt(String),
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Compression(e.to_string())
    }
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }

    pub(crate) fn build(key: impl Into<String>, source: SemanticError) -> Self {
        Self::Build {
            key: key.into(),
            source,
        }
    }
}
