use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::GatePolicy;

/// Resolver stage, in evaluation order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Category,
    Item,
    Modifier,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Category => "category",
            Stage::Item => "item",
            Stage::Modifier => "modifier",
        })
    }
}

/// What happens when two kept categories offer the same item key.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemCollision {
    /// The entry from the lower-ranked category replaces the earlier one but
    /// keeps the earlier candidate position.
    #[default]
    LaterRankWins,
    /// The entry from the higher-ranked category is kept.
    HigherRankWins,
}

/// Tuning for [`Resolver`](crate::Resolver).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Categories kept after Stage A.
    pub top_categories: usize,
    pub category_gate: GatePolicy,
    pub item_gate: GatePolicy,
    pub modifier_gate: GatePolicy,
    pub item_collision: ItemCollision,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            top_categories: 3,
            category_gate: GatePolicy::softmax(),
            item_gate: GatePolicy::raw(),
            modifier_gate: GatePolicy::Open,
            item_collision: ItemCollision::LaterRankWins,
        }
    }
}

impl ResolverConfig {
    /// Same threshold on both gated stages, keeping each stage's gate kind.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.category_gate = self.category_gate.with_threshold(threshold);
        self.item_gate = self.item_gate.with_threshold(threshold);
        self
    }

    pub fn with_top_categories(mut self, top_categories: usize) -> Self {
        self.top_categories = top_categories;
        self
    }

    pub fn with_item_collision(mut self, item_collision: ItemCollision) -> Self {
        self.item_collision = item_collision;
        self
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.top_categories == 0 {
            return Err(MatchError::InvalidConfig(
                "top_categories must be greater than zero".into(),
            ));
        }
        for (stage, gate) in [
            (Stage::Category, &self.category_gate),
            (Stage::Item, &self.item_gate),
            (Stage::Modifier, &self.modifier_gate),
        ] {
            if let Some(threshold) = gate.threshold() {
                if !threshold.is_finite() {
                    return Err(MatchError::InvalidConfig(format!(
                        "{stage} gate threshold must be finite"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Outcome of resolving one query embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    /// `key` is the bare item key or one of its combination keys.
    Matched {
        key: String,
        category: String,
        item: String,
    },
    /// A gate rejected `stage`; `score` is the value it judged.
    NoMatch { stage: Stage, score: f32 },
}

impl Resolution {
    pub fn key(&self) -> Option<&str> {
        match self {
            Resolution::Matched { key, .. } => Some(key),
            Resolution::NoMatch { .. } => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Resolution::Matched { .. })
    }
}

/// One scored candidate of a stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredCandidate {
    pub key: String,
    pub raw: f32,
    pub probability: f32,
}

/// Every candidate the resolver scored, in candidate order, plus the result.
///
/// Stages after a rejection are left empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolutionTrace {
    pub resolution: Resolution,
    pub categories: Vec<ScoredCandidate>,
    /// Keys of the categories passed on to Stage B, in rank order.
    pub kept_categories: Vec<String>,
    pub items: Vec<ScoredCandidate>,
    pub modifiers: Vec<ScoredCandidate>,
}

/// Errors produced by the resolver.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("invalid resolver config: {0}")]
    InvalidConfig(String),
    /// Query length differs from the index dimension.
    #[error("query dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("query embedding contains a non-finite value at position {0}")]
    NonFinite(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = ResolverConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.top_categories, 3);
        assert_eq!(cfg.category_gate, GatePolicy::Softmax { threshold: 0.05 });
        assert_eq!(cfg.item_gate, GatePolicy::Raw { threshold: 0.05 });
        assert_eq!(cfg.modifier_gate, GatePolicy::Open);
        assert_eq!(cfg.item_collision, ItemCollision::LaterRankWins);
    }

    #[test]
    fn zero_top_categories_rejected() {
        let cfg = ResolverConfig::default().with_top_categories(0);
        let err = cfg.validate().expect_err("config should be invalid");
        match err {
            MatchError::InvalidConfig(msg) => assert!(msg.contains("top_categories")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_finite_threshold_rejected() {
        let cfg = ResolverConfig::default().with_threshold(f32::NAN);
        let err = cfg.validate().expect_err("config should be invalid");
        match err {
            MatchError::InvalidConfig(msg) => assert!(msg.contains("category gate")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn with_threshold_keeps_gate_kinds() {
        let cfg = ResolverConfig::default().with_threshold(0.2);
        assert_eq!(cfg.category_gate, GatePolicy::Softmax { threshold: 0.2 });
        assert_eq!(cfg.item_gate, GatePolicy::Raw { threshold: 0.2 });
        assert_eq!(cfg.modifier_gate, GatePolicy::Open);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: ResolverConfig =
            serde_json::from_str(r#"{"item_collision":"higher_rank_wins"}"#).unwrap();
        assert_eq!(cfg.item_collision, ItemCollision::HigherRankWins);
        assert_eq!(cfg.top_categories, 3);
    }

    #[test]
    fn resolution_serializes_with_outcome_tag() {
        let json = serde_json::to_value(Resolution::NoMatch {
            stage: Stage::Item,
            score: 0.0,
        })
        .unwrap();
        assert_eq!(json["outcome"], "no_match");
        assert_eq!(json["stage"], "item");
    }
}
