//! Catalog store on a single redb file.
//!
//! redb transactions are ACID, so [`replace_all`](crate::IndexBackend::replace_all)
//! either lands completely or not at all and a reader never sees half a catalog.
//!
//! ```yaml
//! store:
//!   backend: "redb"
//!   path: "/var/lib/menumatch/catalog.redb"
//! ```

use crate::{IndexBackend, IndexError};
use redb::{Database, ReadableTable, Table, TableDefinition};
use std::path::Path;

const CATALOG_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("menumatch_catalog");

fn backend_err<E: std::fmt::Display>(err: E) -> IndexError {
    IndexError::backend(err)
}

/// Every call runs in its own transaction.
pub struct RedbBackend {
    db: Database,
}

impl RedbBackend {
    /// Open or create the database at `path`.
    ///
    /// ```no_run
    /// use index::RedbBackend;
    ///
    /// let backend = RedbBackend::open("/tmp/catalog.redb")?;
    /// # Ok::<(), index::IndexError>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let backend = Self {
            db: Database::create(path).map_err(backend_err)?,
        };
        // A fresh file has no table yet; create it so reads never fail on it.
        backend.write(|_| Ok(()))?;
        Ok(backend)
    }

    /// Run `f` against the catalog table inside one committed write transaction.
    fn write<F>(&self, f: F) -> Result<(), IndexError>
    where
        F: FnOnce(&mut Table<'_, &'static str, &'static [u8]>) -> Result<(), IndexError>,
    {
        let txn = self.db.begin_write().map_err(backend_err)?;
        {
            let mut table = txn.open_table(CATALOG_TABLE).map_err(backend_err)?;
            f(&mut table)?;
        }
        txn.commit().map_err(backend_err)
    }
}

impl IndexBackend for RedbBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        self.write(|table| {
            table.insert(key, value).map_err(backend_err)?;
            Ok(())
        })
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let txn = self.db.begin_read().map_err(backend_err)?;
        let table = txn.open_table(CATALOG_TABLE).map_err(backend_err)?;
        let value = table.get(key).map_err(backend_err)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn replace_all(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), IndexError> {
        let txn = self.db.begin_write().map_err(backend_err)?;
        txn.delete_table(CATALOG_TABLE).map_err(backend_err)?;
        {
            let mut table = txn.open_table(CATALOG_TABLE).map_err(backend_err)?;
            for (key, value) in &entries {
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(backend_err)?;
            }
        }
        txn.commit().map_err(backend_err)
    }

    fn scan(
        &self,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError> {
        let txn = self.db.begin_read().map_err(backend_err)?;
        let table = txn.open_table(CATALOG_TABLE).map_err(backend_err)?;
        for entry in table.iter().map_err(backend_err)? {
            let (_, value) = entry.map_err(backend_err)?;
            visitor(value.value())?;
        }
        Ok(())
    }
}
