use serde::{Deserialize, Serialize};

/// A dense vector as produced by an [`EmbeddingProvider`](crate::EmbeddingProvider).
pub type Embedding = Vec<f32>;

/// Embedding plus the provenance needed to decide whether two vectors are comparable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SemanticEmbedding {
    /// The text that was encoded.
    pub text: String,
    /// Final embedding values.
    pub vector: Embedding,
    /// Name of the model used to produce the vector.
    pub model_name: String,
    /// Dimension of `vector`.
    pub embedding_dim: usize,
    /// Whether [`vector`](Self::vector) was L2-normalized.
    pub normalized: bool,
}
