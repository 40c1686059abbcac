use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use index::{CatalogIndex, CategoryEntry, ItemEntry};
use semantic::dot;
use tracing::debug;

use crate::metrics::metrics_recorder;
use crate::policy::ConfidenceGate;
use crate::scoring::{argmax, rank_descending, softmax};
use crate::types::{
    ItemCollision, MatchError, Resolution, ResolutionTrace, ResolverConfig, ScoredCandidate, Stage,
};


/// Three-stage resolver over a shared [`CatalogIndex`].
///
/// Stateless per call, so one instance can serve any number of threads.
#[derive(Debug, Clone)]
pub struct Resolver {
    index: Arc<CatalogIndex>,
    config: ResolverConfig,
}

/// Candidate of Stage B together with the category that supplied it.
struct ItemCandidate<'a> {
    category: &'a CategoryEntry,
    item: &'a ItemEntry,
}

impl Resolver {
    pub fn new(index: Arc<CatalogIndex>, config: ResolverConfig) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self { index, config })
    }

    pub fn index(&self) -> &Arc<CatalogIndex> {
        &self.index
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a normalized query embedding to a catalog key.
    ///
    /// Low confidence is reported as [`Resolution::NoMatch`], not as an error.
    pub fn resolve(&self, query: &[f32]) -> Result<Resolution, MatchError> {
        self.run(query, None)
    }

    /// Like [`resolve`](Self::resolve), also returning every score computed
    /// on the way.
    pub fn resolve_explained(&self, query: &[f32]) -> Result<ResolutionTrace, MatchError> {
        let mut trace = ResolutionTrace {
            resolution: Resolution::NoMatch {
                stage: Stage::Category,
                score: 0.0,
            },
            categories: Vec::new(),
            kept_categories: Vec::new(),
            items: Vec::new(),
            modifiers: Vec::new(),
        };
        trace.resolution = self.run(query, Some(&mut trace))?;
        Ok(trace)
    }

    fn run(
        &self,
        query: &[f32],
        trace: Option<&mut ResolutionTrace>,
    ) -> Result<Resolution, MatchError> {
        self.check_query(query)?;
        let start = Instant::now();
        let resolution = self.stages(query, trace);
        let latency = start.elapsed();

        if let Some(recorder) = metrics_recorder() {
            recorder.record_resolution(&resolution, latency);
        }
        Ok(resolution)
    }

    fn check_query(&self, query: &[f32]) -> Result<(), MatchError> {
        let expected = self.index.dimension();
        if query.len() != expected {
            return Err(MatchError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }
        if let Some(pos) = query.iter().position(|v| !v.is_finite()) {
            return Err(MatchError::NonFinite(pos));
        }
        Ok(())
    }

    fn stages(&self, query: &[f32], mut trace: Option<&mut ResolutionTrace>) -> Resolution {
        // Stage A: categories.
        let categories: Vec<&CategoryEntry> = self.index.categories().collect();
        let raw: Vec<f32> = categories
            .iter()
            .map(|c| dot(query, &c.embedding))
            .collect();
        let probs = softmax(&raw);
        if let Some(t) = trace.as_deref_mut() {
            t.categories = scored(categories.iter().map(|c| c.key.as_str()), &raw, &probs);
        }

        let gate = &self.config.category_gate;
        if !gate.admit(&raw) {
            let score = gate.confidence(&raw).unwrap_or_default();
            debug!(stage = %Stage::Category, candidates = raw.len(), score, "no match");
            return Resolution::NoMatch {
                stage: Stage::Category,
                score,
            };
        }
        let mut ranked = rank_descending(&probs);
        ranked.truncate(self.config.top_categories);
        let kept: Vec<&CategoryEntry> = ranked.iter().map(|&i| categories[i]).collect();
        debug!(
            stage = %Stage::Category,
            candidates = raw.len(),
            kept = ?kept.iter().map(|c| c.key.as_str()).collect::<Vec<_>>(),
            "categories ranked"
        );
        if let Some(t) = trace.as_deref_mut() {
            t.kept_categories = kept.iter().map(|c| c.key.clone()).collect();
        }

        // Stage B: items of the kept categories.
        let candidates = merge_items(&kept, self.config.item_collision);
        let raw: Vec<f32> = candidates
            .iter()
            .map(|c| dot(query, &c.item.embedding))
            .collect();
        if let Some(t) = trace.as_deref_mut() {
            t.items = scored(
                candidates.iter().map(|c| c.item.key.as_str()),
                &raw,
                &softmax(&raw),
            );
        }

        let gate = &self.config.item_gate;
        let best = match argmax(&raw) {
            Some(best) if gate.admit(&raw) => best,
            _ => {
                let score = gate.confidence(&raw).unwrap_or_default();
                debug!(stage = %Stage::Item, candidates = raw.len(), score, "no match");
                return Resolution::NoMatch {
                    stage: Stage::Item,
                    score,
                };
            }
        };
        let ItemCandidate { category, item } = &candidates[best];
        debug!(
            stage = %Stage::Item,
            candidates = raw.len(),
            item = %item.key,
            category = %category.key,
            score = raw[best],
            "item selected"
        );

        // Stage C: the bare item competes with each of its combinations.
        let mut keys: Vec<&str> = Vec::with_capacity(item.combinations.len() + 1);
        let mut raw_mod: Vec<f32> = Vec::with_capacity(item.combinations.len() + 1);
        // Bare item goes first so it wins exact ties against its combinations.
        keys.push(item.key.as_str());
        raw_mod.push(raw[best]);
        for (key, embedding) in &item.combinations {
            keys.push(key.as_str());
            raw_mod.push(dot(query, embedding));
        }
        let probs = softmax(&raw_mod);
        if let Some(t) = trace.as_deref_mut() {
            t.modifiers = scored(keys.iter().copied(), &raw_mod, &probs);
        }

        let gate = &self.config.modifier_gate;
        let chosen = match argmax(&probs) {
            Some(chosen) if gate.admit(&raw_mod) => chosen,
            _ => {
                let score = gate.confidence(&raw_mod).unwrap_or_default();
                debug!(stage = %Stage::Modifier, candidates = keys.len(), score, "no match");
                return Resolution::NoMatch {
                    stage: Stage::Modifier,
                    score,
                };
            }
        };
        debug!(
            stage = %Stage::Modifier,
            candidates = keys.len(),
            key = keys[chosen],
            probability = probs[chosen],
            "key resolved"
        );

        Resolution::Matched {
            key: keys[chosen].to_string(),
            category: category.key.clone(),
            item: item.key.clone(),
        }
    }
}

/// Items of `kept` in rank order. A repeated key keeps the position it was
/// first seen at; `policy` decides which entry occupies it.
fn merge_items<'a>(kept: &[&'a CategoryEntry], policy: ItemCollision) -> Vec<ItemCandidate<'a>> {
    let mut merged: Vec<ItemCandidate<'a>> = Vec::new();
    let mut position: HashMap<&'a str, usize> = HashMap::new();
    for &category in kept {
        for item in category.items.values() {
            match position.get(item.key.as_str()) {
                Some(&pos) => {
                    if policy == ItemCollision::LaterRankWins {
                        merged[pos] = ItemCandidate { category, item };
                    }
                }
                None => {
                    position.insert(item.key.as_str(), merged.len());
                    merged.push(ItemCandidate { category, item });
                }
            }
        }
    }
    merged
}

fn scored<'a>(
    keys: impl Iterator<Item = &'a str>,
    raw: &[f32],
    probs: &[f32],
) -> Vec<ScoredCandidate> {
    keys.zip(raw.iter().zip(probs))
        .map(|(key, (&raw, &probability))| ScoredCandidate {
            key: key.to_string(),
            raw,
            probability,
        })
        .collect()
}
