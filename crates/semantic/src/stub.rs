use std::collections::HashMap;

use async_trait::async_trait;
use fxhash::hash64;

use crate::normalize::l2_normalize_in_place;
use crate::{Embedding, EmbeddingProvider, SemanticConfig, SemanticError};

/// Deterministic stand-in for a real model.
///
/// Generates sinusoid values derived from a hash of the input text to guarantee
/// reproducible vectors with minimal CPU cost. The vectors carry no meaning, so
/// this is for wiring, demos, and offline builds, not for match quality.
#[derive(Debug, Clone)]
pub struct StubProvider {
    dimension: usize,
    model_name: String,
    normalize: bool,
}

impl StubProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model_name: format!("stub-{dimension}"),
            normalize: true,
        }
    }

    pub fn from_config(cfg: &SemanticConfig) -> Self {
        Self {
            dimension: cfg.dimension,
            model_name: cfg.model_name.clone(),
            normalize: cfg.normalize,
        }
    }

    pub(crate) fn make_vector(&self, text: &str) -> Embedding {
        let mut v = vec![0f32; self.dimension];
        let h = hash64(text.as_bytes());
        for (idx, value) in v.iter_mut().enumerate() {
            *value = ((h >> (idx % 32)) as f32 * 0.0001).sin();
        }
        if self.normalize {
            l2_normalize_in_place(&mut v);
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for StubProvider {
    async fn encode(&self, text: &str) -> Result<Embedding, SemanticError> {
        Ok(self.make_vector(text))
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Fixed text → vector table.
///
/// Useful for fixtures where the geometry of the vectors matters (e.g. "a coke"
/// must land near the `drinks` category). Unknown texts use the fallback vector
/// when one is set and fail with [`SemanticError::Unavailable`] otherwise.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    dimension: usize,
    table: HashMap<String, Embedding>,
    fallback: Option<Embedding>,
}

impl StaticProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            table: HashMap::new(),
            fallback: None,
        }
    }

    /// Register the vector returned for `text`.
    pub fn with(mut self, text: impl Into<String>, vector: Embedding) -> Self {
        self.table.insert(text.into(), vector);
        self
    }

    /// Vector returned for texts with no registered entry.
    pub fn with_fallback(mut self, vector: Embedding) -> Self {
        self.fallback = Some(vector);
        self
    }

    pub fn insert(&mut self, text: impl Into<String>, vector: Embedding) {
        self.table.insert(text.into(), vector);
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[async_trait]
impl EmbeddingProvider for StaticProvider {
    async fn encode(&self, text: &str) -> Result<Embedding, SemanticError> {
        self.table
            .get(text)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| SemanticError::Unavailable(format!("no vector registered for {text:?}")))
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    fn model_name(&self) -> &str {
        "static-table"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_has_configured_dimension() {
        let provider = StubProvider::new(384);
        let v = provider.encode("hello world").await.unwrap();
        assert_eq!(v.len(), 384);
        assert_eq!(provider.dimension(), Some(384));
        assert_eq!(provider.model_name(), "stub-384");
    }

    #[tokio::test]
    async fn stub_is_deterministic() {
        let provider = StubProvider::new(64);
        let e1 = provider.encode("same text").await.unwrap();
        let e2 = provider.encode("same text").await.unwrap();
        assert_eq!(e1, e2);
    }

    #[tokio::test]
    async fn stub_different_text_differs() {
        let provider = StubProvider::new(64);
        let e1 = provider.encode("hello").await.unwrap();
        let e2 = provider.encode("world").await.unwrap();
        assert_ne!(e1, e2);
    }

    #[tokio::test]
    async fn stub_output_is_normalized_by_default() {
        let provider = StubProvider::new(128);
        let v = provider.encode("test").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "got norm={norm}");
    }

    #[tokio::test]
    async fn stub_respects_normalize_flag() {
        let cfg = SemanticConfig {
            normalize: false,
            dimension: 16,
            ..Default::default()
        };
        let provider = StubProvider::from_config(&cfg);
        let v = provider.encode("test").await.unwrap();
        for (i, &val) in v.iter().enumerate() {
            assert!(
                (-1.0..=1.0).contains(&val),
                "Value at index {i} is {val} which is outside [-1, 1]"
            );
        }
    }

    #[tokio::test]
    async fn stub_handles_empty_and_unicode_text() {
        let provider = StubProvider::new(32);
        assert_eq!(provider.encode("").await.unwrap().len(), 32);
        let v = provider.encode("Hello 世界 🌍").await.unwrap();
        assert!(!v.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn static_table_lookup_and_fallback() {
        let provider = StaticProvider::new(2)
            .with("coke", vec![0.0, 1.0])
            .with_fallback(vec![1.0, 0.0]);
        assert_eq!(provider.encode("coke").await.unwrap(), vec![0.0, 1.0]);
        assert_eq!(provider.encode("unknown").await.unwrap(), vec![1.0, 0.0]);
        assert_eq!(provider.len(), 1);
    }

    #[tokio::test]
    async fn static_table_without_fallback_fails() {
        let provider = StaticProvider::new(2);
        let err = provider.encode("anything").await.unwrap_err();
        assert!(matches!(err, SemanticError::Unavailable(_)));
        assert!(provider.is_empty());
    }
}
