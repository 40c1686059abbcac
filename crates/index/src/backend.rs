use crate::IndexError;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Flat key → bytes store underneath a [`CatalogStore`](crate::CatalogStore).
///
/// A catalog is always written as a whole, so the only bulk write is
/// [`replace_all`](IndexBackend::replace_all).
pub trait IndexBackend: Send + Sync {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError>;
    /// Visit every stored value. Order is backend-defined.
    fn scan(
        &self,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError>;
    /// Atomically drop every existing entry and write `entries` in its place.
    fn replace_all(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), IndexError>;
    fn flush(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

/// Which backend a [`CatalogStore`](crate::CatalogStore) opens.
///
/// ```
/// use index::BackendConfig;
///
/// let scratch = BackendConfig::in_memory();
/// let on_disk = BackendConfig::redb("/var/lib/menumatch/catalog.redb");
/// assert!(matches!(scratch, BackendConfig::InMemory));
/// assert!(matches!(on_disk, BackendConfig::Redb { .. }));
/// ```
#[derive(Clone, Debug, Default)]
pub enum BackendConfig {
    /// Single redb file at `path`. Needs the `backend-redb` feature (on by default).
    Redb { path: String },
    /// Lost when the process exits.
    #[default]
    InMemory,
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }

    /// Open the configured backend. Fails when the backend's feature is disabled.
    pub fn build(&self) -> Result<Box<dyn IndexBackend>, IndexError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::new())),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Box::new(RedbBackend::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(IndexError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

/// Keeps records in a sorted map, so scans visit keys in order.
#[derive(Default)]
pub struct InMemoryBackend {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned<T>(_: T) -> IndexError {
        IndexError::backend("in-memory catalog lock poisoned")
    }
}

impl IndexBackend for InMemoryBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        self.records
            .write()
            .map_err(Self::poisoned)?
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let records = self.records.read().map_err(Self::poisoned)?;
        Ok(records.get(key).cloned())
    }

    fn replace_all(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), IndexError> {
        let mut records = self.records.write().map_err(Self::poisoned)?;
        *records = entries.into_iter().collect();
        Ok(())
    }

    fn scan(
        &self,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError> {
        let records = self.records.read().map_err(Self::poisoned)?;
        records.values().try_for_each(|value| visitor(value))
    }
}

#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use redb::RedbBackend;
