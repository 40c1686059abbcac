//! Workspace umbrella crate for menumatch.
//!
//! Turns a free-text (or spoken) food order into catalog keys with
//! quantities. The heavy lifting lives in the member crates:
//!
//! - `semantic`: embedding providers and vector normalization.
//! - `canonical`: clause segmentation and number-word normalization.
//! - `index`: catalog definition, index builder and persisted store.
//! - `matcher`: the three-stage resolver.
//!
//! This crate stitches them together behind [`OrderAssembler`] and provides
//! the YAML configuration format used by the `menumatch` binary.
//!
//! ```no_run
//! use std::sync::Arc;
//! use menumatch::{AssemblerConfig, OrderAssembler};
//! use menumatch::canonical::SegmentConfig;
//! use menumatch::index::{Catalog, CatalogIndexBuilder};
//! use menumatch::matcher::{Resolver, ResolverConfig};
//! use menumatch::semantic::StubProvider;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(StubProvider::new(64));
//! let catalog = Catalog::from_path("menu.json")?;
//! let index = CatalogIndexBuilder::default().build(&catalog, provider.as_ref()).await?;
//! let resolver = Arc::new(Resolver::new(Arc::new(index), ResolverConfig::default())?);
//!
//! let assembler = OrderAssembler::new(
//!     provider,
//!     resolver,
//!     SegmentConfig::default(),
//!     AssemblerConfig::default(),
//! )?;
//! let order = assembler.assemble("2 cheeseburgers also a coke").await?;
//! for (key, quantity) in &order.lines {
//!     println!("{key}: {quantity}");
//! }
//! # Ok(())
//! # }
//! ```

pub use canonical;
pub use index;
pub use matcher;
pub use semantic;

mod assembler;
pub mod config;
mod voice;

pub use crate::assembler::{
    AssembledOrder, AssemblerConfig, ClauseOutcome, ClauseRecord, OrderAssembler, OrderKey,
};
pub use crate::config::{ConfigLoadError, MenumatchConfig, StoreYamlConfig};
pub use crate::voice::{Transcriber, TranscriptionError};

use canonical::CanonicalError;
use index::IndexError;
use matcher::MatchError;
use semantic::SemanticError;
use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

/// Errors that abort a whole order. Per-clause provider failures are not
/// among them; they are reported in [`AssembledOrder::clauses`].
#[derive(Debug, Clone)]
pub enum PipelineError {
    Segment(CanonicalError),
    Transcription(TranscriptionError),
    Config(String),
    Index(IndexError),
    Match(MatchError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Segment(err) => write!(f, "segmentation failure: {err}"),
            PipelineError::Transcription(err) => write!(f, "transcription failure: {err}"),
            PipelineError::Config(msg) => write!(f, "invalid pipeline config: {msg}"),
            PipelineError::Index(err) => write!(f, "catalog index failure: {err}"),
            PipelineError::Match(err) => write!(f, "resolution failure: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Segment(err) => Some(err),
            PipelineError::Transcription(err) => Some(err),
            PipelineError::Index(err) => Some(err),
            PipelineError::Match(err) => Some(err),
            PipelineError::Config(_) => None,
        }
    }
}

impl From<CanonicalError> for PipelineError {
    fn from(value: CanonicalError) -> Self {
        PipelineError::Segment(value)
    }
}

impl From<TranscriptionError> for PipelineError {
    fn from(value: TranscriptionError) -> Self {
        PipelineError::Transcription(value)
    }
}

impl From<IndexError> for PipelineError {
    fn from(value: IndexError) -> Self {
        PipelineError::Index(value)
    }
}

impl From<MatchError> for PipelineError {
    fn from(value: MatchError) -> Self {
        PipelineError::Match(value)
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    /// `result` carries the number of clauses found.
    fn record_segment(&self, latency: Duration, result: Result<usize, CanonicalError>);
    /// One provider call for one clause, timeouts included.
    fn record_embedding(&self, latency: Duration, result: Result<(), SemanticError>);
    fn record_resolve(&self, latency: Duration, result: Result<(), MatchError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock.write().expect("pipeline metrics lock poisoned");
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_segment(self, result: Result<usize, CanonicalError>) {
        self.recorder.record_segment(self.start.elapsed(), result);
    }

    pub(crate) fn record_embedding(self, result: Result<(), SemanticError>) {
        self.recorder.record_embedding(self.start.elapsed(), result);
    }

    pub(crate) fn record_resolve(self, result: Result<(), MatchError>) {
        self.recorder.record_resolve(self.start.elapsed(), result);
    }
}
