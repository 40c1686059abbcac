//! Catalog definition: what a customer can order.
//!
//! The JSON shape accepted by [`Catalog::from_json_str`]:
//!
//! ```json
//! { "menu": [ { "type": "burgers",
//!               "items": [ { "name": "Cheeseburger", "description": "beef, cheddar",
//!                            "price": 9.5, "optional_changes": ["no pickles"] } ] } ] }
//! ```
//!
//! `categories`/`name`/`modifiers` are accepted in place of
//! `menu`/`type`/`optional_changes`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::IndexError;

/// Ordered categories of orderable items.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    #[serde(alias = "menu")]
    pub categories: Vec<CategoryDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryDef {
    #[serde(alias = "type")]
    pub name: String,
    #[serde(default)]
    pub items: Vec<ItemDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Carried through untouched; resolution never looks at it.
    #[serde(default)]
    pub price: serde_json::Value,
    /// Optional changes, in the order they should appear in combination keys.
    #[serde(default, alias = "optional_changes")]
    pub modifiers: Vec<String>,
}

impl ItemDef {
    /// `"<name>: <description>"`.
    pub fn key(&self) -> String {
        item_key(&self.name, &self.description)
    }
}

/// `"<name>: <description>"`.
pub fn item_key(name: &str, description: &str) -> String {
    format!("{name}: {description}")
}

/// Item key followed by the chosen modifiers, all joined with `", "`.
pub fn combination_key<S: AsRef<str>>(item_key: &str, modifiers: &[S]) -> String {
    let mut key = String::from(item_key);
    for modifier in modifiers {
        key.push_str(", ");
        key.push_str(modifier.as_ref());
    }
    key
}

/// Every non-empty subset of `0..n`, smallest subsets first, each size in
/// lexicographic index order. Yields `2^n - 1` subsets.
pub fn modifier_subsets(n: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    for size in 1..=n {
        let mut idx: Vec<usize> = (0..size).collect();
        loop {
            out.push(idx.clone());
            // advance to the next combination of `size` indices
            let Some(pos) = (0..size).rev().find(|&i| idx[i] != i + n - size) else {
                break;
            };
            idx[pos] += 1;
            for j in pos + 1..size {
                idx[j] = idx[j - 1] + 1;
            }
        }
    }
    out
}

impl Catalog {
    pub fn from_json_str(json: &str) -> Result<Self, IndexError> {
        serde_json::from_str(json)
            .map_err(|e| IndexError::InvalidCatalog(format!("catalog JSON: {e}")))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            IndexError::InvalidCatalog(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Structural checks before any provider call is made.
    pub fn validate(&self, max_modifiers_per_item: usize) -> Result<(), IndexError> {
        if self.categories.is_empty() {
            return Err(IndexError::InvalidCatalog("catalog has no categories".into()));
        }
        for category in &self.categories {
            if category.name.trim().is_empty() {
                return Err(IndexError::InvalidCatalog(
                    "category with empty name".into(),
                ));
            }
            for item in &category.items {
                if item.name.trim().is_empty() {
                    return Err(IndexError::InvalidCatalog(format!(
                        "item with empty name in category {:?}",
                        category.name
                    )));
                }
                if item.modifiers.len() > max_modifiers_per_item {
                    return Err(IndexError::InvalidCatalog(format!(
                        "item {:?} has {} modifiers (limit {max_modifiers_per_item})",
                        item.key(),
                        item.modifiers.len()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MENU: &str = r#"{
        "menu": [
            { "type": "burgers",
              "items": [
                { "name": "Cheeseburger", "description": "beef, cheddar", "price": 9.5,
                  "optional_changes": ["no pickles", "extra cheese"] }
              ] },
            { "type": "drinks",
              "items": [ { "name": "Coke", "description": "330ml", "price": "2.00" } ] }
        ]
    }"#;

    #[test]
    fn parses_original_authoring_format() {
        let catalog = Catalog::from_json_str(MENU).unwrap();
        assert_eq!(catalog.categories.len(), 2);
        assert_eq!(catalog.categories[0].name, "burgers");
        let burger = &catalog.categories[0].items[0];
        assert_eq!(burger.key(), "Cheeseburger: beef, cheddar");
        assert_eq!(burger.modifiers, vec!["no pickles", "extra cheese"]);
        assert_eq!(burger.price, json!(9.5));
        let coke = &catalog.categories[1].items[0];
        assert!(coke.modifiers.is_empty());
        assert_eq!(coke.price, json!("2.00"));
        assert_eq!(catalog.item_count(), 2);
    }

    #[test]
    fn parses_canonical_field_names() {
        let catalog = Catalog::from_json_str(
            r#"{"categories":[{"name":"sides","items":[{"name":"Fries","modifiers":["large"]}]}]}"#,
        )
        .unwrap();
        assert_eq!(catalog.categories[0].items[0].key(), "Fries: ");
        assert_eq!(catalog.categories[0].items[0].price, serde_json::Value::Null);
    }

    #[test]
    fn invalid_json_reported() {
        assert!(matches!(
            Catalog::from_json_str("{"),
            Err(IndexError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn subsets_follow_combination_order() {
        assert_eq!(
            modifier_subsets(3),
            vec![
                vec![0],
                vec![1],
                vec![2],
                vec![0, 1],
                vec![0, 2],
                vec![1, 2],
                vec![0, 1, 2],
            ]
        );
        assert!(modifier_subsets(0).is_empty());
    }

    #[test]
    fn subset_count_is_two_pow_n_minus_one() {
        for n in 0..=10 {
            assert_eq!(modifier_subsets(n).len(), (1usize << n) - 1);
        }
    }

    #[test]
    fn combination_key_format() {
        assert_eq!(
            combination_key("Cheeseburger: beef", &["no pickles", "extra cheese"]),
            "Cheeseburger: beef, no pickles, extra cheese"
        );
    }

    #[test]
    fn validate_rejects_empty_names_and_oversized_items() {
        let mut catalog = Catalog::from_json_str(MENU).unwrap();
        assert!(catalog.validate(12).is_ok());
        assert!(catalog.validate(1).is_err());

        catalog.categories[1].name = " ".into();
        assert!(catalog.validate(12).is_err());

        assert!(Catalog::default().validate(12).is_err());
    }
}
