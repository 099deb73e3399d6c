//! In-memory vector index using cosine distance.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency index
//! backed by a `HashMap` protected by a `tokio::sync::RwLock`. It is suitable
//! for development, testing, and small-scale use cases. Nothing survives a
//! process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{IndexedRecord, MetadataFilter, RetrievalResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{VectorIndex, cosine_distance, rank_by_distance};

/// An in-memory vector index using cosine distance for search.
///
/// Records are stored by id. Every operation takes the lock once, so
/// readers never observe a partially applied batch.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    records: RwLock<HashMap<String, IndexedRecord>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Check that every record in `batch` has the same dimensionality as `existing`.
pub(crate) fn check_dimensions(existing: Option<usize>, batch: &[IndexedRecord]) -> Result<()> {
    let mut expected = existing;
    for record in batch {
        let actual = record.embedding.len();
        match expected {
            Some(expected) if expected != actual => {
                return Err(RagError::DimensionMismatch { expected, actual });
            }
            Some(_) => {}
            None => expected = Some(actual),
        }
    }
    Ok(())
}

/// Check that a query vector matches the dimensionality of the stored records.
pub(crate) fn check_query_dimensions(stored: Option<usize>, query: &[f32]) -> Result<()> {
    match stored {
        Some(expected) if expected != query.len() => {
            Err(RagError::DimensionMismatch { expected, actual: query.len() })
        }
        _ => Ok(()),
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorStore {
    async fn upsert(&self, records: &[IndexedRecord]) -> Result<()> {
        let mut store = self.records.write().await;
        let existing = store.values().next().map(|r| r.embedding.len());
        check_dimensions(existing, records)?;

        for record in records {
            store.insert(record.id.clone(), record.clone());
        }
        debug!(backend = "InMemory", count = records.len(), "upserted records");
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
        let store = self.records.read().await;
        check_query_dimensions(store.values().next().map(|r| r.embedding.len()), embedding)?;
        let scored: Vec<(f32, IndexedRecord)> = store
            .values()
            .map(|record| (cosine_distance(&record.embedding, embedding), record.clone()))
            .collect();
        Ok(rank_by_distance(scored, k))
    }

    async fn delete_where(&self, filter: &MetadataFilter) -> Result<usize> {
        let mut store = self.records.write().await;
        let before = store.len();
        store.retain(|_, record| !filter.matches(&record.metadata));
        let deleted = before - store.len();
        debug!(backend = "InMemory", deleted, "deleted records");
        Ok(deleted)
    }

    async fn replace_where(
        &self,
        filter: &MetadataFilter,
        records: &[IndexedRecord],
    ) -> Result<usize> {
        let mut store = self.records.write().await;
        let remaining = store
            .values()
            .find(|record| !filter.matches(&record.metadata))
            .map(|record| record.embedding.len());
        check_dimensions(remaining, records)?;

        let before = store.len();
        store.retain(|_, record| !filter.matches(&record.metadata));
        let deleted = before - store.len();
        for record in records {
            store.insert(record.id.clone(), record.clone());
        }
        debug!(backend = "InMemory", deleted, inserted = records.len(), "replaced records");
        Ok(deleted)
    }

    async fn list_all(&self) -> Result<Vec<IndexedRecord>> {
        let store = self.records.read().await;
        let mut records: Vec<IndexedRecord> = store.values().cloned().collect();
        records.sort_by(|a, b| {
            a.metadata
                .source_document
                .cmp(&b.metadata.source_document)
                .then(a.metadata.chunk_index.cmp(&b.metadata.chunk_index))
        });
        Ok(records)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}
