//! Bulk-write batching of nutrient facts

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::{dataset_dir, food_rows, nutrient_rows, seed_dictionaries, RecordingStore};
use fdc_common::types::DocType;
use fdc_ingest::{
    BatchedFactWriter, DatasetPlan, FactLayout, IngestConfig, IngestContext, IngestOrchestrator,
    PrimaryEntityLoader, PrimaryLayout,
};

/// 25 foods x 100 nutrients
fn facts_csv() -> String {
    (1..=25).map(|id| nutrient_rows(id, 1..=100)).collect()
}

async fn loaded_context(
    store: Arc<RecordingStore>,
    batch_size: usize,
) -> (tempfile::TempDir, IngestContext) {
    let dir = dataset_dir(&[
        ("food.csv", food_rows(1..=25).as_str()),
        ("food_nutrient.csv", facts_csv().as_str()),
    ]);
    let config = IngestConfig {
        fact_batch_size: batch_size,
        ..Default::default()
    };
    let ctx = IngestContext::new(store, DocType::Legacy, config);
    PrimaryEntityLoader::new(dir.path().join("food.csv"), PrimaryLayout::default())
        .run(&ctx)
        .await
        .unwrap();
    (dir, ctx)
}

#[tokio::test]
async fn test_trailing_partial_batch_is_flushed() {
    let store = Arc::new(RecordingStore::default());
    let (dir, ctx) = loaded_context(store.clone(), 1000).await;

    let rows = BatchedFactWriter::new(dir.path().join("food_nutrient.csv"), FactLayout::default())
        .write(&ctx)
        .await
        .unwrap();

    assert_eq!(rows, 2500);
    assert_eq!(store.sizes(), vec![1000, 1000, 500]);
    assert_eq!(store.inner.fact_count(), 2500);
    assert!(!ctx.counts.snapshot().has_losses());
}

#[tokio::test]
async fn test_exact_multiple_has_no_empty_flush() {
    let store = Arc::new(RecordingStore::default());
    let (dir, ctx) = loaded_context(store.clone(), 500).await;

    BatchedFactWriter::new(dir.path().join("food_nutrient.csv"), FactLayout::default())
        .write(&ctx)
        .await
        .unwrap();

    assert_eq!(store.sizes(), vec![500; 5]);
}

#[tokio::test]
async fn test_rejected_batch_is_dropped_and_writing_continues() {
    let store = Arc::new(RecordingStore::rejecting(&[2]));
    let (dir, ctx) = loaded_context(store.clone(), 1000).await;

    let rows = BatchedFactWriter::new(dir.path().join("food_nutrient.csv"), FactLayout::default())
        .write(&ctx)
        .await
        .unwrap();

    assert_eq!(rows, 2500);
    assert_eq!(store.sizes(), vec![1000, 1000, 500]);
    assert_eq!(store.inner.fact_count(), 1500);

    let counts = ctx.counts.snapshot();
    assert_eq!(counts.dropped_facts, 1000);
    assert_eq!(counts.failed_batches, 1);
    assert_eq!(counts.nutrients, 2500);
}

#[tokio::test]
async fn test_dropped_batch_is_partial_commit_not_failure() {
    let dir = dataset_dir(&[
        ("food.csv", food_rows(1..=25).as_str()),
        ("food_portion.csv", ""),
        ("sr_legacy_food.csv", ""),
        ("food_nutrient.csv", facts_csv().as_str()),
    ]);
    let store = Arc::new(RecordingStore::rejecting(&[1]));
    seed_dictionaries(store.as_ref()).await;

    let report = IngestOrchestrator::new(store.clone(), IngestConfig::default())
        .run(DatasetPlan::for_dataset(DocType::Legacy, dir.path()))
        .await
        .unwrap();

    assert!(report.exit_ok());
    assert!(!report.fully_committed());
    assert_eq!(report.counts.dropped_facts, 1000);
    assert!(report.failed_tasks().next().is_none());
}
