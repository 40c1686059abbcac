#![allow(dead_code)]

use std::sync::Arc;

use menumatch::canonical::SegmentConfig;
use menumatch::index::{BuildOptions, Catalog, CatalogIndex, CatalogIndexBuilder};
use menumatch::matcher::{Resolver, ResolverConfig};
use menumatch::semantic::StaticProvider;
use menumatch::{AssemblerConfig, OrderAssembler};

pub const DIM: usize = 7;

pub const BURGER: &str = "Cheeseburger: beef patty";
pub const NO_PICKLES: &str = "Cheeseburger: beef patty, no pickles";
pub const EXTRA_CHEESE: &str = "Cheeseburger: beef patty, extra cheese";
pub const BOTH: &str = "Cheeseburger: beef patty, no pickles, extra cheese";
pub const COKE: &str = "Coke: 330ml can";
pub const SPRITE: &str = "Sprite: 330ml can";

pub const MENU_JSON: &str = r#"{
    "menu": [
        { "type": "burgers",
          "items": [
            { "name": "Cheeseburger", "description": "beef patty", "price": 9.5,
              "optional_changes": ["no pickles", "extra cheese"] }
          ] },
        { "type": "drinks",
          "items": [
            { "name": "Coke", "description": "330ml can", "price": 2.0 },
            { "name": "Sprite", "description": "330ml can", "price": 2.0 }
          ] }
    ]
}"#;

// Axes: burger, drink, pickles, cheese, cola, lemon, unrelated.
pub fn burger_vec() -> Vec<f32> {
    vec![0.8, 0.0, 0.0, 0.6, 0.0, 0.0, 0.0]
}
pub fn no_pickles_vec() -> Vec<f32> {
    vec![0.6, 0.0, 0.8, 0.0, 0.0, 0.0, 0.0]
}
pub fn extra_cheese_vec() -> Vec<f32> {
    vec![0.6, 0.0, 0.0, 0.8, 0.0, 0.0, 0.0]
}
pub fn both_vec() -> Vec<f32> {
    vec![0.6, 0.0, 0.48, 0.64, 0.0, 0.0, 0.0]
}
pub fn coke_vec() -> Vec<f32> {
    vec![0.0, 0.8, 0.0, 0.0, 0.6, 0.0, 0.0]
}
pub fn sprite_vec() -> Vec<f32> {
    vec![0.0, 0.8, 0.0, 0.0, 0.0, 0.6, 0.0]
}

/// Vectors for every catalog text plus the order phrasings used by the tests.
pub fn provider() -> StaticProvider {
    StaticProvider::new(DIM)
        .with("burgers", vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
        .with("drinks", vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0])
        .with(BURGER, burger_vec())
        .with(NO_PICKLES, no_pickles_vec())
        .with(EXTRA_CHEESE, extra_cheese_vec())
        .with(BOTH, both_vec())
        .with(COKE, coke_vec())
        .with(SPRITE, sprite_vec())
        // order phrasings
        .with("2 cheeseburgers with extra cheese", extra_cheese_vec())
        .with("a cheeseburger", burger_vec())
        .with("1 burger", burger_vec())
        .with("a cheeseburger without pickles", no_pickles_vec())
        .with("a coke", vec![0.0, 0.6, 0.0, 0.0, 0.8, 0.0, 0.0])
        .with("3 cokes", coke_vec())
        .with("a sprite", sprite_vec())
        .with("a unicorn", vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0])
        .with("cheeseburger no pickles", no_pickles_vec())
        .with("coke", coke_vec())
}

pub fn catalog() -> Catalog {
    Catalog::from_json_str(MENU_JSON).expect("fixture catalog parses")
}

pub async fn build_index() -> CatalogIndex {
    build_index_with(BuildOptions::default()).await
}

pub async fn build_index_with(options: BuildOptions) -> CatalogIndex {
    CatalogIndexBuilder::new(options)
        .build(&catalog(), &provider())
        .await
        .expect("fixture index builds")
}

pub fn assembler_for(index: CatalogIndex, config: AssemblerConfig) -> OrderAssembler {
    let resolver = Resolver::new(Arc::new(index), ResolverConfig::default()).expect("resolver");
    OrderAssembler::new(
        Arc::new(provider()),
        Arc::new(resolver),
        SegmentConfig::default(),
        config,
    )
    .expect("assembler")
}

pub async fn assembler() -> OrderAssembler {
    assembler_for(build_index().await, AssemblerConfig::default())
}
