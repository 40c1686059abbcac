//! Order assembly: segment an utterance, resolve every clause, fold the
//! quantities.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use canonical::{ClauseSet, OrderClause, SegmentConfig, normalize_number_words, segment, segment_delimited};
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use matcher::{Resolution, Resolver, Stage};
use semantic::{EmbeddingProvider, SemanticError, semanticize};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::voice::Transcriber;
use crate::{MetricsSpan, PipelineError};

/// Knobs for [`OrderAssembler`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Clauses resolved at the same time.
    pub max_concurrency: usize,
    /// Upper bound for one provider call, in milliseconds.
    pub clause_timeout_ms: u64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            clause_timeout_ms: 10_000,
        }
    }
}

impl AssemblerConfig {
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_clause_timeout(mut self, timeout: Duration) -> Self {
        self.clause_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn clause_timeout(&self) -> Duration {
        Duration::from_millis(self.clause_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_concurrency == 0 {
            return Err(PipelineError::Config(
                "max_concurrency must be at least 1".into(),
            ));
        }
        if self.clause_timeout_ms == 0 {
            return Err(PipelineError::Config(
                "clause_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Line key of an assembled order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderKey {
    Item(String),
    /// Clauses no catalog entry was confident enough for.
    NoMatch,
}

impl OrderKey {
    pub fn as_item(&self) -> Option<&str> {
        match self {
            OrderKey::Item(key) => Some(key),
            OrderKey::NoMatch => None,
        }
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKey::Item(key) => f.write_str(key),
            OrderKey::NoMatch => f.write_str("<no match>"),
        }
    }
}

/// How one clause ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ClauseOutcome {
    Matched(String),
    NoMatch(Stage),
    /// The provider failed or timed out; the clause is left out of the lines.
    Failed(#[serde(serialize_with = "serialize_display")] SemanticError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClauseRecord {
    pub text: String,
    pub quantity: u32,
    pub outcome: ClauseOutcome,
}

/// Result of one order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssembledOrder {
    /// Quantity per resolved key, in first-resolution order.
    #[serde(serialize_with = "serialize_lines")]
    pub lines: IndexMap<OrderKey, u32>,
    /// Every clause in segmentation order.
    pub clauses: Vec<ClauseRecord>,
}

impl AssembledOrder {
    pub fn quantity_of(&self, key: &str) -> Option<u32> {
        self.lines.get(&OrderKey::Item(key.to_string())).copied()
    }

    pub fn unmatched_quantity(&self) -> u32 {
        self.lines.get(&OrderKey::NoMatch).copied().unwrap_or(0)
    }

    /// Clauses whose provider call failed.
    pub fn failures(&self) -> impl Iterator<Item = (&ClauseRecord, &SemanticError)> + '_ {
        self.clauses.iter().filter_map(|clause| match &clause.outcome {
            ClauseOutcome::Failed(err) => Some((clause, err)),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    fn push(&mut self, clause: OrderClause, outcome: ClauseOutcome) {
        let key = match &outcome {
            ClauseOutcome::Matched(key) => Some(OrderKey::Item(key.clone())),
            ClauseOutcome::NoMatch(_) => Some(OrderKey::NoMatch),
            ClauseOutcome::Failed(_) => None,
        };
        if let Some(key) = key {
            let line = self.lines.entry(key).or_insert(0);
            *line = line.saturating_add(clause.quantity);
        }
        self.clauses.push(ClauseRecord {
            text: clause.text,
            quantity: clause.quantity,
            outcome,
        });
    }
}

#[derive(Serialize)]
struct OrderLine<'a> {
    key: Option<&'a str>,
    quantity: u32,
}

fn serialize_lines<S: Serializer>(
    lines: &IndexMap<OrderKey, u32>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(lines.iter().map(|(key, &quantity)| OrderLine {
        key: key.as_item(),
        quantity,
    }))
}

fn serialize_display<S: Serializer>(err: &SemanticError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(err)
}

/// Resolves whole orders against one catalog index.
///
/// The provider must be the one the index was built with.
#[derive(Clone)]
pub struct OrderAssembler {
    provider: Arc<dyn EmbeddingProvider>,
    resolver: Arc<Resolver>,
    segment: SegmentConfig,
    config: AssemblerConfig,
}

impl OrderAssembler {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        resolver: Arc<Resolver>,
        segment: SegmentConfig,
        config: AssemblerConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        segment
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        Ok(Self {
            provider,
            resolver,
            segment,
            config,
        })
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Resolve a typed order such as `"2 cheeseburgers also a coke"`.
    pub async fn assemble(&self, order_text: &str) -> Result<AssembledOrder, PipelineError> {
        let span = MetricsSpan::start();
        let clauses = segment(order_text, &self.segment);
        if let Some(span) = span {
            span.record_segment(Ok(clauses.len()));
        }
        self.resolve_clauses(clauses).await
    }

    /// Like [`assemble`](Self::assemble) after turning `"two"` into `"2"` and
    /// so on, as speech recognizers tend to spell numbers out.
    pub async fn assemble_spoken(&self, transcript: &str) -> Result<AssembledOrder, PipelineError> {
        let normalized = normalize_number_words(transcript);
        debug!(transcript, normalized = %normalized, "number words normalized");
        self.assemble(&normalized).await
    }

    pub async fn assemble_audio(
        &self,
        transcriber: &dyn Transcriber,
        audio: &[u8],
    ) -> Result<AssembledOrder, PipelineError> {
        let transcript = transcriber.transcribe(audio).await?;
        info!(bytes = audio.len(), transcript = %transcript, "audio transcribed");
        self.assemble_spoken(&transcript).await
    }

    /// Resolve a `;`-separated `<quantity> <name>` list. Any malformed
    /// segment fails the whole call.
    pub async fn assemble_delimited(&self, text: &str) -> Result<AssembledOrder, PipelineError> {
        let span = MetricsSpan::start();
        let clauses = match segment_delimited(text) {
            Ok(clauses) => {
                if let Some(span) = span {
                    span.record_segment(Ok(clauses.len()));
                }
                clauses
            }
            Err(err) => {
                if let Some(span) = span {
                    span.record_segment(Err(err.clone()));
                }
                return Err(PipelineError::Segment(err));
            }
        };
        self.resolve_clauses(clauses).await
    }

    async fn resolve_clauses(&self, clauses: ClauseSet) -> Result<AssembledOrder, PipelineError> {
        let start = Instant::now();
        let resolved: Vec<(OrderClause, Result<ClauseOutcome, PipelineError>)> =
            stream::iter(clauses)
                .map(|clause| async move {
                    let outcome = self.resolve_clause(&clause.text).await;
                    (clause, outcome)
                })
                .buffered(self.config.max_concurrency)
                .collect()
                .await;

        let mut order = AssembledOrder::default();
        for (clause, outcome) in resolved {
            let outcome = outcome?;
            if let ClauseOutcome::Failed(err) = &outcome {
                warn!(clause = %clause.text, error = %err, "clause not resolved");
            }
            order.push(clause, outcome);
        }

        info!(
            clauses = order.clauses.len(),
            lines = order.lines.len(),
            failures = order.failures().count(),
            elapsed_micros = start.elapsed().as_micros() as u64,
            "order assembled"
        );
        Ok(order)
    }

    async fn resolve_clause(&self, text: &str) -> Result<ClauseOutcome, PipelineError> {
        let dimension = self.resolver.index().dimension();
        let timeout = self.config.clause_timeout();

        let span = MetricsSpan::start();
        let embedded = match tokio::time::timeout(
            timeout,
            semanticize(self.provider.as_ref(), text, Some(dimension)),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SemanticError::Timeout(self.config.clause_timeout_ms)),
        };
        if let Some(span) = span {
            span.record_embedding(embedded.as_ref().map(|_| ()).map_err(Clone::clone));
        }
        let embedding = match embedded {
            Ok(embedding) => embedding,
            Err(err) => return Ok(ClauseOutcome::Failed(err)),
        };

        let span = MetricsSpan::start();
        let resolution = self.resolver.resolve(&embedding.vector);
        if let Some(span) = span {
            span.record_resolve(resolution.as_ref().map(|_| ()).map_err(Clone::clone));
        }
        let outcome = match resolution? {
            Resolution::Matched { key, .. } => ClauseOutcome::Matched(key),
            Resolution::NoMatch { stage, score } => {
                debug!(clause = text, %stage, score, "clause below confidence");
                ClauseOutcome::NoMatch(stage)
            }
        };
        Ok(outcome)
    }
}

impl fmt::Debug for OrderAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderAssembler")
            .field("model", &self.provider.model_name())
            .field("resolver", &self.resolver)
            .field("segment", &self.segment)
            .field("config", &self.config)
            .finish()
    }
}
