use std::sync::Arc;

use async_trait::async_trait;

use crate::api::ApiProvider;
use crate::normalize::l2_normalize_in_place;
use crate::stub::StubProvider;
use crate::{Embedding, SemanticConfig, SemanticEmbedding, SemanticError};

/// Text → vector boundary.
///
/// Implementations must be deterministic for a given deployment and must be
/// the same provider at index-build time and at query time, otherwise scores
/// are meaningless. They are shared across tasks as `Arc<dyn EmbeddingProvider>`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Encode one text into a raw (not necessarily normalized) vector.
    async fn encode(&self, text: &str) -> Result<Embedding, SemanticError>;

    /// Fixed output dimension, when known before the first call.
    fn dimension(&self) -> Option<usize>;

    /// Label recorded alongside vectors produced by this provider.
    fn model_name(&self) -> &str;
}

/// Encode `text`, validate the output and L2-normalize it.
///
/// When `expected_dim` is set, vectors of any other length are rejected with
/// [`SemanticError::DimensionMismatch`]. Empty, non-finite, all-zero or
/// overflowing vectors are reported as [`SemanticError::Malformed`].
pub async fn semanticize(
    provider: &dyn EmbeddingProvider,
    text: &str,
    expected_dim: Option<usize>,
) -> Result<SemanticEmbedding, SemanticError> {
    let mut vector = provider.encode(text).await?;

    if vector.is_empty() {
        return Err(SemanticError::Malformed(format!(
            "provider returned an empty vector for {text:?}"
        )));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(SemanticError::Malformed(format!(
            "provider returned non-finite values for {text:?}"
        )));
    }
    if let Some(expected) = expected_dim.or_else(|| provider.dimension()) {
        if vector.len() != expected {
            return Err(SemanticError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
    }

    let norm_sq: f32 = vector.iter().map(|x| x * x).sum();
    if norm_sq == 0.0 || !norm_sq.is_finite() {
        return Err(SemanticError::Malformed(format!(
            "provider returned a vector that cannot be unit-normalized for {text:?}"
        )));
    }

    l2_normalize_in_place(&mut vector);
    let embedding_dim = vector.len();

    Ok(SemanticEmbedding {
        text: text.to_string(),
        vector,
        model_name: provider.model_name().to_string(),
        embedding_dim,
        normalized: true,
    })
}

/// Build the provider selected by `cfg.mode`.
pub fn provider_from_config(
    cfg: &SemanticConfig,
) -> Result<Arc<dyn EmbeddingProvider>, SemanticError> {
    cfg.validate()?;
    match cfg.mode.as_str() {
        "api" => Ok(Arc::new(ApiProvider::new(cfg.clone())?)),
        _ => Ok(Arc::new(StubProvider::from_config(cfg))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StaticProvider;

    #[tokio::test]
    async fn semanticize_normalizes_output() {
        let provider = StaticProvider::new(2).with("x", vec![3.0, 4.0]);
        let embedding = semanticize(&provider, "x", None).await.unwrap();
        assert!(embedding.normalized);
        assert!((embedding.vector[0] - 0.6).abs() < 1e-6);
        assert!((embedding.vector[1] - 0.8).abs() < 1e-6);
        assert_eq!(embedding.embedding_dim, 2);
        assert_eq!(embedding.text, "x");
    }

    #[tokio::test]
    async fn semanticize_rejects_wrong_dimension() {
        let provider = StaticProvider::new(3).with("x", vec![1.0, 0.0, 0.0]);
        let err = semanticize(&provider, "x", Some(4)).await.unwrap_err();
        assert_eq!(
            err,
            SemanticError::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[tokio::test]
    async fn semanticize_rejects_non_finite() {
        let provider = StaticProvider::new(2).with("x", vec![f32::NAN, 1.0]);
        let err = semanticize(&provider, "x", None).await.unwrap_err();
        assert!(matches!(err, SemanticError::Malformed(_)));
    }

    #[tokio::test]
    async fn semanticize_rejects_vectors_without_a_direction() {
        let provider = StaticProvider::new(2)
            .with("zero", vec![0.0, 0.0])
            .with("huge", vec![1e30, 1e30]);
        for text in ["zero", "huge"] {
            let err = semanticize(&provider, text, None).await.unwrap_err();
            assert!(matches!(err, SemanticError::Malformed(_)), "{text}: {err}");
        }
    }

    #[tokio::test]
    async fn provider_from_config_defaults_to_stub() {
        let provider = provider_from_config(&SemanticConfig::default()).unwrap();
        assert_eq!(provider.dimension(), Some(384));
        let embedding = semanticize(provider.as_ref(), "two burgers", None)
            .await
            .unwrap();
        assert_eq!(embedding.vector.len(), 384);
    }

    #[test]
    fn provider_from_config_rejects_invalid_api_config() {
        let cfg = SemanticConfig {
            mode: "api".into(),
            ..Default::default()
        };
        assert!(provider_from_config(&cfg).is_err());
    }
}
