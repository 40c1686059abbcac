//! # menumatch resolver (`matcher`)
//!
//! Maps one normalized query embedding to a catalog key in three stages over a
//! shared [`index::CatalogIndex`]:
//!
//! 1. **Category.** Every category is scored by dot product and ranked by
//!    softmax probability. The best [`ResolverConfig::top_categories`] are
//!    kept if the category gate admits the scores.
//! 2. **Item.** The items of the kept categories are merged in rank order
//!    (repeated keys follow [`ItemCollision`]) and the best raw score wins if
//!    the item gate admits it.
//! 3. **Modifier.** The bare item competes with each of its modifier
//!    combinations; the most probable key is the result.
//!
//! A gate that rejects yields [`Resolution::NoMatch`] naming the stage. Only
//! malformed queries are errors ([`MatchError`]).
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use index::{CatalogIndex, CategoryEntry, ItemEntry};
//! use matcher::{Resolution, Resolver, ResolverConfig};
//!
//! let index = CatalogIndex::new(2, "fixture")
//!     .with_category(
//!         CategoryEntry::new("drinks", vec![1.0, 0.0])
//!             .with_item(ItemEntry::new("Coke: 330ml", vec![1.0, 0.0])),
//!     )
//!     .unwrap();
//! let resolver = Resolver::new(Arc::new(index), ResolverConfig::default()).unwrap();
//!
//! match resolver.resolve(&[1.0, 0.0]).unwrap() {
//!     Resolution::Matched { key, .. } => assert_eq!(key, "Coke: 330ml"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```
//!
//! ## Observability
//!
//! Install a [`ResolverMetrics`] implementation via [`set_resolver_metrics`] to
//! record latency and outcome of every call. Per-stage decisions are emitted
//! as `tracing` debug events.

pub mod engine;
pub mod metrics;
pub mod policy;
pub mod scoring;
pub mod types;

pub use crate::engine::Resolver;
pub use crate::metrics::{set_resolver_metrics, ResolverMetrics};
pub use crate::policy::{
    ConfidenceGate, GatePolicy, OpenGate, RawScoreGate, SoftmaxGate, DEFAULT_THRESHOLD,
};
pub use crate::types::{
    ItemCollision, MatchError, Resolution, ResolutionTrace, ResolverConfig, ScoredCandidate, Stage,
};
