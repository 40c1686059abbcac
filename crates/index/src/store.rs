//! Persisting a [`CatalogIndex`] to an [`IndexBackend`].
//!
//! Layout, one record per entry:
//!
//! ```text
//! manifest                                  schema version, dimension, model, counts
//! c␟<category>                              category embedding
//! i␟<category>␟<item>                       item embedding
//! m␟<category>␟<item>␟<combination>         combination embedding
//! ```
//!
//! `␟` is the ASCII unit separator (0x1F). Each record carries its own keys and
//! an ordinal, so [`CatalogStore::load`] can rebuild catalog order from a plain
//! backend scan. Records are bincode-encoded, then compressed.

use std::time::Instant;

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use semantic::Embedding;
use serde::{Deserialize, Serialize};
use tracing::info;
use zstd::{decode_all, encode_all};

use crate::{
    BackendConfig, CatalogIndex, CategoryEntry, IndexBackend, IndexError, IndexStats, ItemEntry,
};

/// Bump this value whenever the stored record layout changes.
pub const STORE_SCHEMA_VERSION: u16 = 1;

const MANIFEST_KEY: &str = "manifest";
const SEP: char = '\u{1f}';

/// Compression codec options for stored records.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    /// No compression (useful for debugging).
    None,
    /// Zstd compression (default, good balance of speed and ratio).
    #[default]
    Zstd,
}

/// Compression behavior configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Compression level (1-22 for Zstd, where higher = better compression but slower).
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn new(codec: CompressionCodec, level: i32) -> Self {
        Self { codec, level }
    }

    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(encode_all(data, self.level)?),
        }
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(decode_all(data)?),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Manifest {
    schema_version: u16,
    dimension: usize,
    model_name: String,
    categories: usize,
    items: usize,
    combinations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
enum StoredRecord {
    Manifest(Manifest),
    Category {
        ordinal: u64,
        category: String,
        vector: Embedding,
    },
    Item {
        ordinal: u64,
        category: String,
        item: String,
        vector: Embedding,
    },
    Combination {
        ordinal: u64,
        category: String,
        item: String,
        combination: String,
        vector: Embedding,
    },
}

impl StoredRecord {
    fn ordinal(&self) -> u64 {
        match self {
            StoredRecord::Manifest(_) => 0,
            StoredRecord::Category { ordinal, .. }
            | StoredRecord::Item { ordinal, .. }
            | StoredRecord::Combination { ordinal, .. } => *ordinal,
        }
    }

    fn vector(&self) -> Option<&Embedding> {
        match self {
            StoredRecord::Manifest(_) => None,
            StoredRecord::Category { vector, .. }
            | StoredRecord::Item { vector, .. }
            | StoredRecord::Combination { vector, .. } => Some(vector),
        }
    }
}

fn category_key(category: &str) -> String {
    format!("c{SEP}{category}")
}

fn item_key(category: &str, item: &str) -> String {
    format!("i{SEP}{category}{SEP}{item}")
}

fn combination_key(category: &str, item: &str, combination: &str) -> String {
    format!("m{SEP}{category}{SEP}{item}{SEP}{combination}")
}

/// Saves and loads a [`CatalogIndex`] through an [`IndexBackend`].
pub struct CatalogStore {
    backend: Box<dyn IndexBackend>,
    compression: CompressionConfig,
}

impl CatalogStore {
    /// Open the configured backend.
    pub fn open(backend: &BackendConfig, compression: CompressionConfig) -> Result<Self, IndexError> {
        Ok(Self::with_backend(backend.build()?, compression))
    }

    /// Wrap an existing backend (e.g., in-memory for tests).
    pub fn with_backend(backend: Box<dyn IndexBackend>, compression: CompressionConfig) -> Self {
        Self {
            backend,
            compression,
        }
    }

    pub fn in_memory() -> Self {
        Self::with_backend(
            Box::new(crate::InMemoryBackend::new()),
            CompressionConfig::default(),
        )
    }

    /// Replace whatever the backend held with `index`, in one batch.
    pub fn save(&self, index: &CatalogIndex) -> Result<IndexStats, IndexError> {
        let start = Instant::now();
        let stats = index.stats();
        let manifest = Manifest {
            schema_version: STORE_SCHEMA_VERSION,
            dimension: index.dimension(),
            model_name: index.model_name().to_string(),
            categories: stats.categories,
            items: stats.items,
            combinations: stats.combinations,
        };

        let mut entries = Vec::with_capacity(1 + stats.categories + stats.items + stats.combinations);
        entries.push((
            MANIFEST_KEY.to_string(),
            self.encode_record(&StoredRecord::Manifest(manifest))?,
        ));

        let mut ordinal = 0u64;
        let mut next_ordinal = || {
            ordinal += 1;
            ordinal
        };
        for category in index.categories() {
            let record = StoredRecord::Category {
                ordinal: next_ordinal(),
                category: category.key.clone(),
                vector: category.embedding.clone(),
            };
            entries.push((category_key(&category.key), self.encode_record(&record)?));

            for item in category.items.values() {
                let record = StoredRecord::Item {
                    ordinal: next_ordinal(),
                    category: category.key.clone(),
                    item: item.key.clone(),
                    vector: item.embedding.clone(),
                };
                entries.push((item_key(&category.key, &item.key), self.encode_record(&record)?));

                for (combination, vector) in &item.combinations {
                    let record = StoredRecord::Combination {
                        ordinal: next_ordinal(),
                        category: category.key.clone(),
                        item: item.key.clone(),
                        combination: combination.clone(),
                        vector: vector.clone(),
                    };
                    entries.push((
                        combination_key(&category.key, &item.key, combination),
                        self.encode_record(&record)?,
                    ));
                }
            }
        }

        let records = entries.len();
        self.backend.replace_all(entries)?;
        self.backend.flush()?;

        info!(
            records,
            categories = stats.categories,
            items = stats.items,
            combinations = stats.combinations,
            elapsed_micros = start.elapsed().as_micros() as u64,
            "catalog index saved"
        );
        Ok(stats)
    }

    /// Read the stored index back, checking it against its manifest.
    ///
    /// With `expected_dimension` set, an index of any other dimension is
    /// rejected with [`IndexError::DimensionMismatch`].
    pub fn load(&self, expected_dimension: Option<usize>) -> Result<CatalogIndex, IndexError> {
        let start = Instant::now();
        let manifest = match self.backend.get(MANIFEST_KEY)? {
            Some(bytes) => match self.decode_record(&bytes)? {
                StoredRecord::Manifest(manifest) => manifest,
                _ => return Err(IndexError::Corrupt("manifest key holds an entry record".into())),
            },
            None => return Err(IndexError::Corrupt("store holds no catalog index".into())),
        };

        if manifest.schema_version != STORE_SCHEMA_VERSION {
            return Err(IndexError::Corrupt(format!(
                "unsupported schema version {} (expected {STORE_SCHEMA_VERSION})",
                manifest.schema_version
            )));
        }
        if let Some(expected) = expected_dimension {
            if expected != manifest.dimension {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: manifest.dimension,
                });
            }
        }

        let mut records = Vec::new();
        self.backend.scan(&mut |bytes| {
            let record = self.decode_record(bytes)?;
            if let Some(vector) = record.vector() {
                if vector.len() != manifest.dimension {
                    return Err(IndexError::Corrupt(format!(
                        "stored vector has dimension {} but manifest says {}",
                        vector.len(),
                        manifest.dimension
                    )));
                }
                records.push(record);
            }
            Ok(())
        })?;
        records.sort_by_key(StoredRecord::ordinal);

        let index = rebuild(&manifest, records)?;
        let stats = index.stats();
        if (stats.categories, stats.items, stats.combinations)
            != (manifest.categories, manifest.items, manifest.combinations)
        {
            return Err(IndexError::Corrupt(format!(
                "entry counts {stats:?} do not match manifest"
            )));
        }

        info!(
            categories = stats.categories,
            items = stats.items,
            combinations = stats.combinations,
            dimension = manifest.dimension,
            elapsed_micros = start.elapsed().as_micros() as u64,
            "catalog index loaded"
        );
        Ok(index)
    }

    fn encode_record(&self, record: &StoredRecord) -> Result<Vec<u8>, IndexError> {
        let bytes = encode_to_vec(record, standard())?;
        self.compression.compress(&bytes)
    }

    fn decode_record(&self, data: &[u8]) -> Result<StoredRecord, IndexError> {
        let bytes = self.compression.decompress(data)?;
        let (record, _): (StoredRecord, usize) = decode_from_slice(&bytes, standard())?;
        Ok(record)
    }
}

/// Fold ordinal-sorted records back into nested entries.
fn rebuild(manifest: &Manifest, records: Vec<StoredRecord>) -> Result<CatalogIndex, IndexError> {
    let mut index = CatalogIndex::new(manifest.dimension, manifest.model_name.clone());
    let mut current: Option<CategoryEntry> = None;
    let mut current_item: Option<ItemEntry> = None;

    fn close_item(category: &mut Option<CategoryEntry>, item: &mut Option<ItemEntry>) -> Result<(), IndexError> {
        if let Some(item) = item.take() {
            category
                .as_mut()
                .ok_or_else(|| IndexError::Corrupt("item record before any category".into()))?
                .insert_item(item);
        }
        Ok(())
    }

    for record in records {
        match record {
            StoredRecord::Manifest(_) => {}
            StoredRecord::Category {
                category, vector, ..
            } => {
                close_item(&mut current, &mut current_item)?;
                if let Some(done) = current.take() {
                    index.insert_category(done)?;
                }
                current = Some(CategoryEntry::new(category, vector));
            }
            StoredRecord::Item {
                category,
                item,
                vector,
                ..
            } => {
                close_item(&mut current, &mut current_item)?;
                if current.as_ref().map(|c| c.key.as_str()) != Some(category.as_str()) {
                    return Err(IndexError::Corrupt(format!(
                        "item {item:?} is out of place for category {category:?}"
                    )));
                }
                current_item = Some(ItemEntry::new(item, vector));
            }
            StoredRecord::Combination {
                item,
                combination,
                vector,
                ..
            } => {
                let open = current_item
                    .as_mut()
                    .filter(|open| open.key == item)
                    .ok_or_else(|| {
                        IndexError::Corrupt(format!(
                            "combination {combination:?} is out of place for item {item:?}"
                        ))
                    })?;
                open.insert_combination(combination, vector);
            }
        }
    }
    close_item(&mut current, &mut current_item)?;
    if let Some(done) = current.take() {
        index.insert_category(done)?;
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryBackend;

    fn sample_index() -> CatalogIndex {
        CatalogIndex::new(2, "stub-2")
            .with_category(
                CategoryEntry::new("burgers", vec![1.0, 0.0])
                    .with_item(
                        ItemEntry::new("Cheeseburger: beef", vec![0.6, 0.8])
                            .with_combination("Cheeseburger: beef, no pickles", vec![0.8, 0.6])
                            .with_combination("Cheeseburger: beef, extra cheese", vec![0.0, 1.0]),
                    )
                    .with_item(ItemEntry::new("Hamburger: beef", vec![1.0, 0.0])),
            )
            .unwrap()
            .with_category(
                CategoryEntry::new("drinks", vec![0.0, 1.0])
                    .with_item(ItemEntry::new("Coke: 330ml", vec![0.0, 1.0])),
            )
            .unwrap()
    }

    #[test]
    fn save_then_load_preserves_everything() {
        let store = CatalogStore::in_memory();
        let index = sample_index();
        let stats = store.save(&index).unwrap();
        assert_eq!(stats.combinations, 2);

        let loaded = store.load(Some(2)).unwrap();
        assert_eq!(loaded, index);
    }

    #[test]
    fn load_without_compression() {
        let store = CatalogStore::with_backend(
            Box::new(InMemoryBackend::new()),
            CompressionConfig::default().with_codec(CompressionCodec::None),
        );
        store.save(&sample_index()).unwrap();
        assert_eq!(store.load(None).unwrap(), sample_index());
    }

    #[test]
    fn load_rejects_other_dimension() {
        let store = CatalogStore::in_memory();
        store.save(&sample_index()).unwrap();
        assert!(matches!(
            store.load(Some(384)),
            Err(IndexError::DimensionMismatch {
                expected: 384,
                actual: 2
            })
        ));
    }

    #[test]
    fn load_from_empty_store_fails() {
        let store = CatalogStore::in_memory();
        assert!(matches!(store.load(None), Err(IndexError::Corrupt(_))));
    }

    #[test]
    fn save_replaces_previous_index() {
        let store = CatalogStore::in_memory();
        store.save(&sample_index()).unwrap();

        let smaller = CatalogIndex::new(2, "stub-2")
            .with_category(CategoryEntry::new("sides", vec![1.0, 0.0]))
            .unwrap();
        store.save(&smaller).unwrap();

        assert_eq!(store.load(None).unwrap(), smaller);
    }

    #[test]
    fn keys_use_unit_separator() {
        assert_eq!(category_key("a"), "c\u{1f}a");
        assert_eq!(item_key("a", "b"), "i\u{1f}a\u{1f}b");
        assert_eq!(combination_key("a", "b", "c"), "m\u{1f}a\u{1f}b\u{1f}c");
    }

    #[test]
    fn tampered_vector_detected() {
        let backend = InMemoryBackend::new();
        let store = CatalogStore::with_backend(Box::new(backend), CompressionConfig::default());
        store.save(&sample_index()).unwrap();

        let bad = StoredRecord::Category {
            ordinal: 1,
            category: "burgers".into(),
            vector: vec![1.0, 0.0, 0.0],
        };
        let bytes = store.encode_record(&bad).unwrap();
        store.backend.put(&category_key("burgers"), &bytes).unwrap();

        assert!(matches!(store.load(None), Err(IndexError::Corrupt(_))));
    }

    #[cfg(feature = "backend-redb")]
    #[test]
    fn redb_roundtrip_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.redb");
        let config = BackendConfig::redb(path.to_string_lossy().to_string());
        {
            let store = CatalogStore::open(&config, CompressionConfig::default()).unwrap();
            store.save(&sample_index()).unwrap();
        }
        let store = CatalogStore::open(&config, CompressionConfig::default()).unwrap();
        assert_eq!(store.load(Some(2)).unwrap(), sample_index());
    }
}
