use indexmap::IndexMap;
use semantic::Embedding;
use serde::{Deserialize, Serialize};

use crate::IndexError;

/// One item and the embeddings of its modifier combinations.
///
/// The bare item (no modifiers) is represented by [`key`](Self::key) and
/// [`embedding`](Self::embedding); it is never stored in `combinations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemEntry {
    pub key: String,
    pub embedding: Embedding,
    pub combinations: IndexMap<String, Embedding>,
}

impl ItemEntry {
    pub fn new(key: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            key: key.into(),
            embedding,
            combinations: IndexMap::new(),
        }
    }

    /// Builder-style [`insert_combination`](Self::insert_combination).
    pub fn with_combination(mut self, key: impl Into<String>, embedding: Embedding) -> Self {
        self.insert_combination(key, embedding);
        self
    }

    /// A repeated key replaces the earlier embedding and keeps its position.
    pub fn insert_combination(&mut self, key: impl Into<String>, embedding: Embedding) {
        self.combinations.insert(key.into(), embedding);
    }
}

/// One category and its items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryEntry {
    pub key: String,
    pub embedding: Embedding,
    pub items: IndexMap<String, ItemEntry>,
}

impl CategoryEntry {
    pub fn new(key: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            key: key.into(),
            embedding,
            items: IndexMap::new(),
        }
    }

    pub fn with_item(mut self, item: ItemEntry) -> Self {
        self.insert_item(item);
        self
    }

    /// A repeated item key replaces the earlier entry and keeps its position.
    pub fn insert_item(&mut self, item: ItemEntry) {
        self.items.insert(item.key.clone(), item);
    }
}

/// Entry counts of a [`CatalogIndex`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStats {
    pub categories: usize,
    pub items: usize,
    pub combinations: usize,
}

/// Category → item → combination embeddings, in catalog order.
///
/// Every embedding has the same dimension, recorded in [`dimension`](Self::dimension).
/// Built once and shared read-only afterwards, typically as `Arc<CatalogIndex>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogIndex {
    dimension: usize,
    model_name: String,
    categories: IndexMap<String, CategoryEntry>,
}

impl CatalogIndex {
    pub fn new(dimension: usize, model_name: impl Into<String>) -> Self {
        Self {
            dimension,
            model_name: model_name.into(),
            categories: IndexMap::new(),
        }
    }

    /// Insert a category, checking every embedding it carries.
    ///
    /// A repeated category key replaces the earlier entry and keeps its position.
    pub fn insert_category(&mut self, category: CategoryEntry) -> Result<(), IndexError> {
        self.check_dimension(&category.embedding)?;
        for item in category.items.values() {
            self.check_dimension(&item.embedding)?;
            for embedding in item.combinations.values() {
                self.check_dimension(embedding)?;
            }
        }
        self.categories.insert(category.key.clone(), category);
        Ok(())
    }

    pub fn with_category(mut self, category: CategoryEntry) -> Result<Self, IndexError> {
        self.insert_category(category)?;
        Ok(self)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Label of the provider that produced the embeddings.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn categories(&self) -> impl ExactSizeIterator<Item = &CategoryEntry> + '_ {
        self.categories.values()
    }

    pub fn category(&self, key: &str) -> Option<&CategoryEntry> {
        self.categories.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            categories: self.categories.len(),
            ..IndexStats::default()
        };
        for category in self.categories.values() {
            stats.items += category.items.len();
            stats.combinations += category
                .items
                .values()
                .map(|item| item.combinations.len())
                .sum::<usize>();
        }
        stats
    }

    /// Fails with [`IndexError::DimensionMismatch`] unless `vector` has the index dimension.
    pub fn check_dimension(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burger_category() -> CategoryEntry {
        CategoryEntry::new("burgers", vec![1.0, 0.0]).with_item(
            ItemEntry::new("Cheeseburger: beef", vec![1.0, 0.0])
                .with_combination("Cheeseburger: beef, no pickles", vec![0.0, 1.0]),
        )
    }

    #[test]
    fn stats_count_every_level() {
        let index = CatalogIndex::new(2, "test")
            .with_category(burger_category())
            .unwrap()
            .with_category(CategoryEntry::new("drinks", vec![0.0, 1.0]))
            .unwrap();
        assert_eq!(
            index.stats(),
            IndexStats {
                categories: 2,
                items: 1,
                combinations: 1
            }
        );
        assert_eq!(index.model_name(), "test");
    }

    #[test]
    fn insert_rejects_wrong_dimension_anywhere() {
        let mut index = CatalogIndex::new(3, "test");
        let err = index.insert_category(burger_category()).unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(index.is_empty());
    }

    #[test]
    fn repeated_category_overwrites_in_place() {
        let index = CatalogIndex::new(2, "test")
            .with_category(CategoryEntry::new("a", vec![1.0, 0.0]))
            .unwrap()
            .with_category(CategoryEntry::new("b", vec![0.0, 1.0]))
            .unwrap()
            .with_category(CategoryEntry::new("a", vec![0.0, 1.0]))
            .unwrap();
        let keys: Vec<&str> = index.categories().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(index.category("a").unwrap().embedding, vec![0.0, 1.0]);
    }

    #[test]
    fn repeated_item_overwrites_in_place() {
        let category = CategoryEntry::new("c", vec![1.0])
            .with_item(ItemEntry::new("x", vec![1.0]))
            .with_item(ItemEntry::new("y", vec![1.0]))
            .with_item(ItemEntry::new("x", vec![-1.0]));
        let keys: Vec<&String> = category.items.keys().collect();
        assert_eq!(keys, vec!["x", "y"]);
        assert_eq!(category.items["x"].embedding, vec![-1.0]);
    }
}
