//! Tests for the SQLite-backed vector index.
#![cfg(feature = "sqlite")]

use pdfchat_rag::document::{ChunkMetadata, IndexedRecord, MetadataFilter};
use pdfchat_rag::sqlite::SqliteVectorStore;
use pdfchat_rag::vectorstore::VectorIndex;

fn record(id: &str, source: &str, chunk_index: usize, embedding: Vec<f32>) -> IndexedRecord {
    IndexedRecord {
        id: id.to_string(),
        embedding,
        text: format!("text of {id}"),
        metadata: ChunkMetadata {
            source_document: source.to_string(),
            chunk_index,
            total_chunks: 2,
            start_offset: chunk_index * 10,
            end_offset: chunk_index * 10 + 9,
        },
    }
}

#[tokio::test]
async fn upsert_query_and_list_roundtrip_metadata() {
    let store = SqliteVectorStore::in_memory("docs").await.unwrap();
    store
        .upsert(&[record("a0", "a.pdf", 0, vec![1.0, 0.0]), record("a1", "a.pdf", 1, vec![0.0, 1.0])])
        .await
        .unwrap();

    let results = store.query(&[0.0, 1.0], 5).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk.id, "a1");
    assert_eq!(results[0].rank, 0);
    assert!(results[0].distance.unwrap() < 1e-6);
    assert_eq!(results[0].chunk.metadata.start_offset, 10);

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, "a0");
    assert_eq!(all[1].embedding, vec![0.0, 1.0]);
}

#[tokio::test]
async fn reupsert_is_idempotent() {
    let store = SqliteVectorStore::in_memory("docs").await.unwrap();
    store.upsert(&[record("x", "a.pdf", 0, vec![1.0, 0.0])]).await.unwrap();

    let mut replacement = record("x", "a.pdf", 0, vec![0.0, 1.0]);
    replacement.text = "replaced".to_string();
    store.upsert(&[replacement]).await.unwrap();

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].text, "replaced");
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn delete_where_counts_removed_rows() {
    let store = SqliteVectorStore::in_memory("docs").await.unwrap();
    store
        .upsert(&[
            record("a0", "a.pdf", 0, vec![1.0, 0.0]),
            record("a1", "a.pdf", 1, vec![1.0, 0.0]),
            record("b0", "b.pdf", 0, vec![1.0, 0.0]),
        ])
        .await
        .unwrap();

    let deleted =
        store.delete_where(&MetadataFilter::SourceDocument("a.pdf".into())).await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn failed_batch_leaves_index_untouched() {
    let store = SqliteVectorStore::in_memory("docs").await.unwrap();
    store.upsert(&[record("a0", "a.pdf", 0, vec![1.0, 0.0])]).await.unwrap();

    let result = store
        .upsert(&[record("b0", "b.pdf", 0, vec![1.0, 0.0]), record("b1", "b.pdf", 1, vec![1.0])])
        .await;
    assert!(result.is_err());
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn records_survive_reopening_the_database() {
    let dir = std::env::temp_dir().join(format!("pdfchat-test-{}", uuid_like()));
    let path = dir.join("index.db");

    {
        let store = SqliteVectorStore::open(&path, "docs").await.unwrap();
        store.upsert(&[record("p0", "persist.pdf", 0, vec![1.0, 0.0])]).await.unwrap();
    }

    let reopened = SqliteVectorStore::open(&path, "docs").await.unwrap();
    let all = reopened.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].metadata.source_document, "persist.pdf");

    let _ = std::fs::remove_dir_all(dir);
}

fn uuid_like() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}-{nanos}", std::process::id())
}

#[tokio::test]
async fn query_with_wrong_dimension_is_rejected() {
    let store = SqliteVectorStore::in_memory("docs").await.unwrap();
    store.upsert(&[record("a0", "a.pdf", 0, vec![1.0, 0.0])]).await.unwrap();

    let err = store.query(&[1.0, 0.0, 0.0], 3).await.unwrap_err();
    assert!(matches!(err, pdfchat_rag::RagError::DimensionMismatch { expected: 2, actual: 3 }));
}

#[tokio::test]
async fn replace_where_is_atomic() {
    let store = SqliteVectorStore::in_memory("docs").await.unwrap();
    store
        .upsert(&[
            record("a0", "a.pdf", 0, vec![1.0, 0.0]),
            record("a1", "a.pdf", 1, vec![0.0, 1.0]),
            record("b0", "b.pdf", 0, vec![1.0, 1.0]),
        ])
        .await
        .unwrap();
    let filter = MetadataFilter::SourceDocument("a.pdf".to_string());

    let err = store.replace_where(&filter, &[record("a2", "a.pdf", 0, vec![1.0, 0.0, 0.0])]).await;
    assert!(err.is_err());
    assert_eq!(store.count().await.unwrap(), 3);

    let replaced =
        store.replace_where(&filter, &[record("a2", "a.pdf", 0, vec![0.5, 0.5])]).await.unwrap();
    assert_eq!(replaced, 2);
    let ids: Vec<String> = store.list_all().await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["a2".to_string(), "b0".to_string()]);
}
