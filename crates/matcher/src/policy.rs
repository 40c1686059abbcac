//! Confidence gates deciding whether a stage's scores are good enough to
//! continue.
//!
//! Every gate sees the raw dot-product scores of all candidates of one stage.
//! Raising a gate's threshold can only turn an admit into a reject, never the
//! other way round.

use serde::{Deserialize, Serialize};

use crate::scoring::softmax;

/// Threshold used by the default gates.
pub const DEFAULT_THRESHOLD: f32 = 0.05;

/// Per-stage acceptance rule.
pub trait ConfidenceGate {
    /// The value this gate compares against its threshold, or `None` when
    /// there is nothing to judge.
    fn confidence(&self, raw_scores: &[f32]) -> Option<f32>;

    fn admit(&self, raw_scores: &[f32]) -> bool;
}

/// Admits when the best softmax probability reaches `threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftmaxGate {
    pub threshold: f32,
}

impl ConfidenceGate for SoftmaxGate {
    fn confidence(&self, raw_scores: &[f32]) -> Option<f32> {
        softmax(raw_scores).into_iter().reduce(f32::max)
    }

    fn admit(&self, raw_scores: &[f32]) -> bool {
        self.confidence(raw_scores)
            .is_some_and(|p| p >= self.threshold)
    }
}

/// Admits when the best raw similarity reaches `threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawScoreGate {
    pub threshold: f32,
}

impl ConfidenceGate for RawScoreGate {
    fn confidence(&self, raw_scores: &[f32]) -> Option<f32> {
        raw_scores.iter().copied().reduce(f32::max)
    }

    fn admit(&self, raw_scores: &[f32]) -> bool {
        self.confidence(raw_scores)
            .is_some_and(|s| s >= self.threshold)
    }
}

/// Admits any non-empty candidate set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OpenGate;

impl ConfidenceGate for OpenGate {
    fn confidence(&self, raw_scores: &[f32]) -> Option<f32> {
        softmax(raw_scores).into_iter().reduce(f32::max)
    }

    fn admit(&self, raw_scores: &[f32]) -> bool {
        !raw_scores.is_empty()
    }
}

/// Serializable choice of gate for one resolver stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatePolicy {
    Softmax { threshold: f32 },
    Raw { threshold: f32 },
    Open,
}

impl GatePolicy {
    pub fn softmax() -> Self {
        GatePolicy::Softmax {
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn raw() -> Self {
        GatePolicy::Raw {
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn threshold(&self) -> Option<f32> {
        match self {
            GatePolicy::Softmax { threshold } | GatePolicy::Raw { threshold } => Some(*threshold),
            GatePolicy::Open => None,
        }
    }

    /// Copy of this policy with a different threshold. `Open` is unchanged.
    pub fn with_threshold(self, threshold: f32) -> Self {
        match self {
            GatePolicy::Softmax { .. } => GatePolicy::Softmax { threshold },
            GatePolicy::Raw { .. } => GatePolicy::Raw { threshold },
            GatePolicy::Open => GatePolicy::Open,
        }
    }
}

impl ConfidenceGate for GatePolicy {
    fn confidence(&self, raw_scores: &[f32]) -> Option<f32> {
        match *self {
            GatePolicy::Softmax { threshold } => SoftmaxGate { threshold }.confidence(raw_scores),
            GatePolicy::Raw { threshold } => RawScoreGate { threshold }.confidence(raw_scores),
            GatePolicy::Open => OpenGate.confidence(raw_scores),
        }
    }

    fn admit(&self, raw_scores: &[f32]) -> bool {
        match *self {
            GatePolicy::Softmax { threshold } => SoftmaxGate { threshold }.admit(raw_scores),
            GatePolicy::Raw { threshold } => RawScoreGate { threshold }.admit(raw_scores),
            GatePolicy::Open => OpenGate.admit(raw_scores),
        }
    }
}
