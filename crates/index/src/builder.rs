//! Offline expansion of a [`Catalog`] into a [`CatalogIndex`].
//!
//! One provider call is made per category, per item and per non-empty subset
//! of each item's modifiers. Calls run concurrently up to
//! [`BuildOptions::concurrency`], but results are always assembled in
//! definition order, so the same catalog and provider give the same index.

use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use semantic::{semanticize, Embedding, EmbeddingProvider};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{combination_key, modifier_subsets};
use crate::{Catalog, CatalogIndex, CategoryEntry, IndexError, ItemEntry};

/// Knobs for [`CatalogIndexBuilder`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildOptions {
    /// Maximum number of in-flight provider calls.
    pub concurrency: usize,
    /// Items with more modifiers than this are rejected before embedding starts
    /// (an item with n modifiers costs 2^n - 1 provider calls).
    pub max_modifiers_per_item: usize,
    /// Required vector dimension. Falls back to the provider's own dimension,
    /// then to whatever the first vector has.
    pub expected_dimension: Option<usize>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            max_modifiers_per_item: 12,
            expected_dimension: None,
        }
    }
}

impl BuildOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_max_modifiers_per_item(mut self, max: usize) -> Self {
        self.max_modifiers_per_item = max;
        self
    }

    pub fn with_expected_dimension(mut self, dimension: usize) -> Self {
        self.expected_dimension = Some(dimension);
        self
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.concurrency == 0 {
            return Err(IndexError::InvalidCatalog(
                "build concurrency must be at least 1".into(),
            ));
        }
        if self.expected_dimension == Some(0) {
            return Err(IndexError::InvalidCatalog(
                "expected dimension must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// What a build produced.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildStats {
    pub categories: usize,
    pub items: usize,
    pub combinations: usize,
    /// Provider calls made.
    pub embeddings: usize,
    pub elapsed_micros: u64,
}

/// Builds a [`CatalogIndex`] from a [`Catalog`] with an [`EmbeddingProvider`].
#[derive(Debug, Clone, Default)]
pub struct CatalogIndexBuilder {
    options: BuildOptions,
}

impl CatalogIndexBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Embed every entry of `catalog`. Any provider failure aborts the whole
    /// build; a partial index is never returned.
    pub async fn build(
        &self,
        catalog: &Catalog,
        provider: &dyn EmbeddingProvider,
    ) -> Result<CatalogIndex, IndexError> {
        self.build_with_stats(catalog, provider)
            .await
            .map(|(index, _)| index)
    }

    pub async fn build_with_stats(
        &self,
        catalog: &Catalog,
        provider: &dyn EmbeddingProvider,
    ) -> Result<(CatalogIndex, BuildStats), IndexError> {
        self.options.validate()?;
        catalog.validate(self.options.max_modifiers_per_item)?;
        let start = Instant::now();

        let texts = embedding_texts(catalog);
        let expected_dim = self.options.expected_dimension.or_else(|| provider.dimension());
        debug!(
            texts = texts.len(),
            concurrency = self.options.concurrency,
            "embedding catalog"
        );

        let vectors: Vec<Embedding> = stream::iter(texts.iter())
            .map(|text| async move {
                semanticize(provider, text, expected_dim)
                    .await
                    .map(|embedding| embedding.vector)
                    .map_err(|source| IndexError::build(text.as_str(), source))
            })
            .buffered(self.options.concurrency)
            .try_collect()
            .await?;

        let dimension = match expected_dim {
            Some(dim) => dim,
            None => vectors.first().map(Vec::len).unwrap_or_default(),
        };
        let index = assemble(catalog, vectors, dimension, provider.model_name())?;

        let counts = index.stats();
        let stats = BuildStats {
            categories: counts.categories,
            items: counts.items,
            combinations: counts.combinations,
            embeddings: texts.len(),
            elapsed_micros: start.elapsed().as_micros() as u64,
        };
        info!(
            categories = stats.categories,
            items = stats.items,
            combinations = stats.combinations,
            embeddings = stats.embeddings,
            dimension,
            model = provider.model_name(),
            elapsed_micros = stats.elapsed_micros,
            "catalog index built"
        );
        Ok((index, stats))
    }
}

/// Texts to embed, in the order [`assemble`] consumes them.
fn embedding_texts(catalog: &Catalog) -> Vec<String> {
    let mut texts = Vec::new();
    for category in &catalog.categories {
        texts.push(category.name.clone());
        for item in &category.items {
            let key = item.key();
            texts.push(key.clone());
            for subset in modifier_subsets(item.modifiers.len()) {
                let chosen: Vec<&str> = subset.iter().map(|&i| item.modifiers[i].as_str()).collect();
                texts.push(combination_key(&key, &chosen));
            }
        }
    }
    texts
}

fn assemble(
    catalog: &Catalog,
    vectors: Vec<Embedding>,
    dimension: usize,
    model_name: &str,
) -> Result<CatalogIndex, IndexError> {
    let mut index = CatalogIndex::new(dimension, model_name);
    let mut vectors = vectors.into_iter();
    let mut next = |key: &str| {
        vectors
            .next()
            .ok_or_else(|| IndexError::Corrupt(format!("no embedding produced for {key:?}")))
    };

    for category in &catalog.categories {
        let mut entry = CategoryEntry::new(category.name.clone(), next(&category.name)?);
        for item in &category.items {
            let key = item.key();
            let mut item_entry = ItemEntry::new(key.clone(), next(&key)?);
            for subset in modifier_subsets(item.modifiers.len()) {
                let chosen: Vec<&str> = subset.iter().map(|&i| item.modifiers[i].as_str()).collect();
                let combo = combination_key(&key, &chosen);
                let embedding = next(&combo)?;
                item_entry.insert_combination(combo, embedding);
            }
            entry.insert_item(item_entry);
        }
        index.insert_category(entry)?;
    }
    Ok(index)
}
