use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One per-item fragment of an order utterance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderClause {
    /// Matchable text, whitespace-collapsed.
    pub text: String,
    /// Always at least 1.
    pub quantity: u32,
}

/// Ordered clauses of one utterance, keyed by text.
///
/// Keeps the position where a text was first seen; later clauses with the same
/// text either add to or replace its quantity depending on how they were
/// inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseSet {
    entries: IndexMap<String, u32>,
}

impl ClauseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` to the clause for `text`, creating it if needed.
    pub fn add(&mut self, text: impl Into<String>, quantity: u32) {
        let slot = self.entries.entry(text.into()).or_insert(0);
        *slot = slot.saturating_add(quantity);
    }

    /// Set the quantity for `text`, overwriting any previous value.
    pub fn replace(&mut self, text: impl Into<String>, quantity: u32) {
        self.entries.insert(text.into(), quantity);
    }

    pub fn quantity_of(&self, text: &str) -> Option<u32> {
        self.entries.get(text).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> u64 {
        self.entries.values().map(|&q| u64::from(q)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.entries.iter().map(|(text, &quantity)| (text.as_str(), quantity))
    }

    pub fn to_clauses(&self) -> Vec<OrderClause> {
        self.iter()
            .map(|(text, quantity)| OrderClause {
                text: text.to_string(),
                quantity,
            })
            .collect()
    }
}

impl IntoIterator for ClauseSet {
    type Item = OrderClause;
    type IntoIter = std::vec::IntoIter<OrderClause>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .into_iter()
            .map(|(text, quantity)| OrderClause { text, quantity })
            .collect::<Vec<_>>()
            .into_iter()
    }
}
