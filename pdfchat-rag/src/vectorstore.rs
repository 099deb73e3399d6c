//! Vector index trait for storing and searching chunk embeddings.

use async_trait::async_trait;

use crate::document::{IndexedRecord, MetadataFilter, RetrievalResult};
use crate::error::Result;

/// A keyed similarity index over [`IndexedRecord`]s.
///
/// Implementations must make each call appear atomic to concurrent readers:
/// a query never observes half of an `upsert` batch or half of a
/// `delete_where`.
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::{InMemoryVectorStore, VectorIndex};
///
/// let store = InMemoryVectorStore::new();
/// store.upsert(&records).await?;
/// let results = store.query(&query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace records by id.
    ///
    /// Re-upserting an id fully replaces its text, vector and metadata.
    async fn upsert(&self, records: &[IndexedRecord]) -> Result<()>;

    /// Return the `k` records nearest to `embedding`, ordered by ascending
    /// cosine distance. Fewer than `k` results are returned only when the
    /// index holds fewer than `k` records.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievalResult>>;

    /// Delete every record whose metadata matches `filter`, returning how many were removed.
    async fn delete_where(&self, filter: &MetadataFilter) -> Result<usize>;

    /// Atomically delete every record matching `filter` and insert `records`.
    ///
    /// Either both steps take effect or neither does; on error the index is
    /// left exactly as it was. Returns how many records were removed.
    async fn replace_where(&self, filter: &MetadataFilter, records: &[IndexedRecord])
    -> Result<usize>;

    /// Enumerate all records held by the index.
    async fn list_all(&self) -> Result<Vec<IndexedRecord>>;

    /// Number of records held by the index.
    async fn count(&self) -> Result<usize> {
        Ok(self.list_all().await?.len())
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Cosine distance (`1 - similarity`), unclamped so it can be used for ordering.
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Sort `(distance, record)` pairs ascending, keep the first `k`, and turn them
/// into ranked results with distances clamped to `[0, 1]`.
pub(crate) fn rank_by_distance(
    mut scored: Vec<(f32, IndexedRecord)>,
    k: usize,
) -> Vec<RetrievalResult> {
    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
        .into_iter()
        .enumerate()
        .map(|(rank, (distance, record))| RetrievalResult {
            chunk: crate::document::RetrievedChunk {
                id: record.id,
                text: record.text,
                metadata: record.metadata,
            },
            distance: Some(distance.clamp(0.0, 1.0)),
            rank,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_zero_distance() {
        let a = vec![1.0, 2.0, 3.0];
        assert!(cosine_distance(&a, &a).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_unit_distance() {
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_has_zero_similarity() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
