//! Tests for the in-memory vector index: ordering, idempotent upsert, filtered delete.

use std::collections::HashMap;

use pdfchat_rag::document::{ChunkMetadata, IndexedRecord, MetadataFilter};
use pdfchat_rag::inmemory::InMemoryVectorStore;
use pdfchat_rag::vectorstore::VectorIndex;
use pdfchat_rag::RagError;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

fn metadata(source: &str, chunk_index: usize, total_chunks: usize) -> ChunkMetadata {
    ChunkMetadata {
        source_document: source.to_string(),
        chunk_index,
        total_chunks,
        start_offset: 0,
        end_offset: 0,
    }
}

/// Generate a record with a normalized embedding.
fn arb_record(dim: usize) -> impl Strategy<Value = IndexedRecord> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(id, text, embedding)| IndexedRecord {
            id,
            embedding,
            text,
            metadata: metadata("doc_1.pdf", 0, 1),
        },
    )
}

fn record(id: &str, source: &str, text: &str, embedding: Vec<f32>) -> IndexedRecord {
    IndexedRecord { id: id.to_string(), embedding, text: text.to_string(), metadata: metadata(source, 0, 1) }
}

/// *For any* set of records stored in an InMemoryVectorStore, querying SHALL
/// return results ordered by ascending cosine distance, ranked from zero, and
/// exactly `min(k, stored)` of them.
mod prop_inmemory_query_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_ascending_and_sized_by_k(
            records in proptest::collection::vec(arb_record(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, unique_count) = rt.block_on(async {
                let store = InMemoryVectorStore::new();

                // Deduplicate by id so the expected count is known
                let mut deduped: HashMap<String, IndexedRecord> = HashMap::new();
                for record in &records {
                    deduped.entry(record.id.clone()).or_insert_with(|| record.clone());
                }
                let unique: Vec<IndexedRecord> = deduped.into_values().collect();
                let count = unique.len();

                store.upsert(&unique).await.unwrap();
                (store.query(&query, k).await.unwrap(), count)
            });

            prop_assert_eq!(results.len(), k.min(unique_count));

            for (i, result) in results.iter().enumerate() {
                prop_assert_eq!(result.rank, i);
                let distance = result.distance.unwrap();
                prop_assert!((0.0..=1.0).contains(&distance));
            }

            for window in results.windows(2) {
                prop_assert!(
                    window[0].distance <= window[1].distance,
                    "results not in ascending order: {:?} > {:?}",
                    window[0].distance,
                    window[1].distance,
                );
            }
        }
    }
}

#[tokio::test]
async fn reupsert_replaces_record_without_growing_the_index() {
    let store = InMemoryVectorStore::new();
    store.upsert(&[record("c1", "f.pdf", "old text", vec![1.0, 0.0])]).await.unwrap();
    store.upsert(&[record("c1", "f.pdf", "new text", vec![0.0, 1.0])]).await.unwrap();

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].text, "new text");
    assert_eq!(all[0].embedding, vec![0.0, 1.0]);
}

#[tokio::test]
async fn nearest_record_comes_first() {
    let store = InMemoryVectorStore::new();
    store
        .upsert(&[
            record("far", "a.pdf", "far", vec![0.0, 1.0]),
            record("near", "b.pdf", "near", vec![1.0, 0.1]),
        ])
        .await
        .unwrap();

    let results = store.query(&[1.0, 0.0], 5).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk.id, "near");
    assert_eq!(results[1].chunk.id, "far");
}

#[tokio::test]
async fn empty_index_returns_no_results() {
    let store = InMemoryVectorStore::new();
    assert!(store.query(&[1.0, 0.0], 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_where_removes_only_matching_source() {
    let store = InMemoryVectorStore::new();
    store
        .upsert(&[
            record("a1", "a.pdf", "x", vec![1.0, 0.0]),
            record("a2", "a.pdf", "y", vec![1.0, 0.0]),
            record("b1", "b.pdf", "z", vec![1.0, 0.0]),
        ])
        .await
        .unwrap();

    let deleted =
        store.delete_where(&MetadataFilter::SourceDocument("a.pdf".into())).await.unwrap();
    assert_eq!(deleted, 2);

    let remaining = store.list_all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].metadata.source_document, "b.pdf");

    let again = store.delete_where(&MetadataFilter::SourceDocument("a.pdf".into())).await.unwrap();
    assert_eq!(again, 0);
}

#[tokio::test]
async fn mismatched_dimensions_are_rejected() {
    let store = InMemoryVectorStore::new();
    store.upsert(&[record("a", "a.pdf", "x", vec![1.0, 0.0])]).await.unwrap();

    let err = store.upsert(&[record("b", "a.pdf", "y", vec![1.0, 0.0, 0.0])]).await.unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 3 }));
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn query_with_wrong_dimension_is_rejected() {
    let store = InMemoryVectorStore::new();
    store.upsert(&[record("a", "a.pdf", "alpha", vec![1.0, 0.0, 0.0])]).await.unwrap();

    let err = store.query(&[1.0, 0.0], 3).await.unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 3, actual: 2 }));
}

#[tokio::test]
async fn query_on_empty_store_accepts_any_dimension() {
    let store = InMemoryVectorStore::new();
    assert!(store.query(&[1.0, 0.0], 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn replace_where_swaps_one_document() {
    let store = InMemoryVectorStore::new();
    store
        .upsert(&[
            record("a0", "a.pdf", "old a0", vec![1.0, 0.0]),
            record("a1", "a.pdf", "old a1", vec![0.0, 1.0]),
            record("b0", "b.pdf", "b", vec![1.0, 1.0]),
        ])
        .await
        .unwrap();

    let replaced = store
        .replace_where(
            &MetadataFilter::SourceDocument("a.pdf".to_string()),
            &[record("a2", "a.pdf", "new", vec![0.5, 0.5])],
        )
        .await
        .unwrap();

    assert_eq!(replaced, 2);
    let ids: Vec<String> = store.list_all().await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["a2".to_string(), "b0".to_string()]);
}

#[tokio::test]
async fn failed_replace_keeps_the_previous_version() {
    let store = InMemoryVectorStore::new();
    store
        .upsert(&[
            record("a0", "a.pdf", "old", vec![1.0, 0.0]),
            record("b0", "b.pdf", "b", vec![0.0, 1.0]),
        ])
        .await
        .unwrap();

    let err = store
        .replace_where(
            &MetadataFilter::SourceDocument("a.pdf".to_string()),
            &[record("a1", "a.pdf", "new", vec![1.0, 0.0, 0.0])],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 3 }));
    let ids: Vec<String> = store.list_all().await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["a0".to_string(), "b0".to_string()]);
}

#[tokio::test]
async fn replacing_the_only_document_may_change_dimension() {
    let store = InMemoryVectorStore::new();
    store.upsert(&[record("a0", "a.pdf", "old", vec![1.0, 0.0])]).await.unwrap();

    store
        .replace_where(
            &MetadataFilter::SourceDocument("a.pdf".to_string()),
            &[record("a1", "a.pdf", "new", vec![0.0, 0.0, 1.0])],
        )
        .await
        .unwrap();

    assert_eq!(store.query(&[0.0, 0.0, 1.0], 1).await.unwrap()[0].chunk.id, "a1");
}
