//! # menumatch index
//!
//! Offline half of menumatch: everything needed to turn a catalog definition
//! into a [`CatalogIndex`] of precomputed embeddings and to keep that index on
//! disk between runs.
//!
//! ## Core pieces
//!
//! - [`Catalog`]: the catalog definition (categories → items → optional
//!   modifiers), loaded from JSON.
//! - [`CatalogIndexBuilder`]: expands every item into all of its modifier
//!   combinations and embeds each one through a
//!   [`semantic::EmbeddingProvider`].
//! - [`CatalogIndex`]: the immutable, ordered result, shared as
//!   `Arc<CatalogIndex>` by the resolver.
//! - [`CatalogStore`]: saves/loads an index through a pluggable
//!   [`IndexBackend`] (in-memory, or redb with the default `backend-redb`
//!   feature). Records are bincode-encoded and Zstd-compressed.
//!
//! ## Example Usage
//!
//! ```
//! use index::{Catalog, CatalogIndexBuilder, CatalogStore};
//! use semantic::StubProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let catalog = Catalog::from_json_str(
//!     r#"{"menu":[{"type":"drinks","items":[{"name":"Coke","description":"330ml"}]}]}"#,
//! ).unwrap();
//! let provider = StubProvider::new(32);
//! let index = CatalogIndexBuilder::default().build(&catalog, &provider).await.unwrap();
//!
//! let store = CatalogStore::in_memory();
//! store.save(&index).unwrap();
//! assert_eq!(store.load(Some(32)).unwrap(), index);
//! # }
//! ```

mod backend;
mod builder;
pub mod catalog;
mod error;
mod store;
mod types;

#[cfg(feature = "backend-redb")]
pub use backend::RedbBackend;
pub use backend::{BackendConfig, InMemoryBackend, IndexBackend};
pub use builder::{BuildOptions, BuildStats, CatalogIndexBuilder};
pub use catalog::{Catalog, CategoryDef, ItemDef};
pub use error::IndexError;
pub use store::{CatalogStore, CompressionCodec, CompressionConfig, STORE_SCHEMA_VERSION};
pub use types::{CatalogIndex, CategoryEntry, IndexStats, ItemEntry};
