mod common;

use menumatch::index::BuildOptions;
use menumatch::AssemblerConfig;

use common::*;

const ORDER: &str =
    "2 cheeseburgers with extra cheese also a coke also a unicorn also a cheeseburger without pickles";

#[tokio::test]
async fn index_build_is_reproducible() {
    let first = build_index().await;
    let second = build_index().await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn build_concurrency_does_not_change_the_index() {
    let serial = build_index_with(BuildOptions::default().with_concurrency(1)).await;
    let wide = build_index_with(BuildOptions::default().with_concurrency(32)).await;
    assert_eq!(serial, wide);
}

#[tokio::test]
async fn repeated_orders_assemble_identically() {
    let assembler = assembler().await;
    let first = assembler.assemble(ORDER).await.unwrap();
    for _ in 0..10 {
        assert_eq!(assembler.assemble(ORDER).await.unwrap(), first);
    }
}

#[tokio::test]
async fn clause_concurrency_does_not_change_the_order() {
    let index = build_index().await;
    let serial = assembler_for(
        index.clone(),
        AssemblerConfig::default().with_max_concurrency(1),
    )
    .assemble(ORDER)
    .await
    .unwrap();
    let wide = assembler_for(index, AssemblerConfig::default().with_max_concurrency(16))
        .assemble(ORDER)
        .await
        .unwrap();

    assert_eq!(serial, wide);
    let texts: Vec<&str> = serial.clauses.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "2 cheeseburgers with extra cheese",
            "a coke",
            "a unicorn",
            "a cheeseburger without pickles",
        ]
    );
}

#[tokio::test]
async fn serialized_order_is_stable() {
    let assembler = assembler().await;
    let a = serde_json::to_string(&assembler.assemble(ORDER).await.unwrap()).unwrap();
    let b = serde_json::to_string(&assembler.assemble(ORDER).await.unwrap()).unwrap();
    assert_eq!(a, b);
}
