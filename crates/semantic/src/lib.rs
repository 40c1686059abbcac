//! menumatch semantic layer
//!
//! Everything that turns text into vectors lives here. Callers only ever see
//! the [`EmbeddingProvider`] trait; which concrete provider sits behind it is a
//! deployment decision made through [`SemanticConfig`].
//!
//! Providers:
//!
//! - **Stub** ([`StubProvider`], mode `"fast"`) - deterministic hash-derived
//!   vectors. No network, no model files. Good for wiring and demos.
//! - **Static table** ([`StaticProvider`]) - text → vector fixtures for tests
//!   where the geometry has to be controlled.
//! - **HTTP** ([`ApiProvider`], mode `"api"`) - Hugging Face, OpenAI, or a custom
//!   endpoint, with optional retry.
//!
//! [`semanticize`] wraps any provider: it checks the output (dimension,
//! finiteness) and L2-normalizes it, so the dot product of two results is their
//! cosine similarity.
//!
//! ## Quick example
//!
//! ```
//! use semantic::{semanticize, StubProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = StubProvider::new(64);
//!     let embedding = semanticize(&provider, "two burgers", None).await.unwrap();
//!     assert_eq!(embedding.embedding_dim, 64);
//!     assert!(embedding.normalized);
//! }
//! ```
//!
//! ## Env vars to know
//!
//! - `MENUMATCH_API_URL` - Override the API endpoint
//! - `MENUMATCH_API_TOKEN` - Bearer token for the endpoint

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

mod api;
mod normalize;
mod provider;
mod serde_millis;
mod stub;

pub use crate::api::ApiProvider;
pub use crate::config::{SemanticConfig, ENV_API_TOKEN, ENV_API_URL};
pub use crate::error::SemanticError;
pub use crate::normalize::{dot, is_unit_norm, l2_norm, l2_normalize_in_place};
pub use crate::provider::{provider_from_config, semanticize, EmbeddingProvider};
pub use crate::retry::RetryConfig;
pub use crate::stub::{StaticProvider, StubProvider};
pub use crate::types::{Embedding, SemanticEmbedding};
