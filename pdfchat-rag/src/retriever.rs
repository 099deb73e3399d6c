//! Query-time retrieval: embed the query, then ask the index for neighbours.

use std::sync::Arc;

use tracing::{debug, error};

use crate::config::DEFAULT_TOP_K;
use crate::document::RetrievalResult;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::vectorstore::VectorIndex;

/// Produces ranked passages for a query string.
///
/// Results are returned exactly as the index ordered them (ascending cosine
/// distance); there is no re-ranking step.
#[derive(Clone)]
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    /// Create a retriever over `index` using `embedding_provider` for queries.
    pub fn new(embedding_provider: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedding_provider, index }
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector index.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Retrieve the [`DEFAULT_TOP_K`] nearest passages.
    pub async fn retrieve_default(&self, query: &str) -> Result<Vec<RetrievalResult>> {
        self.retrieve(query, DEFAULT_TOP_K).await
    }

    /// Retrieve up to `k` passages nearest to `query`.
    ///
    /// An empty index yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Propagates embedding failures and index errors unchanged.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedding_provider.embed_one(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during retrieval");
            e
        })?;

        let results = self.index.query(&query_embedding, k).await.map_err(|e| {
            error!(error = %e, "vector index query failed");
            e
        })?;

        debug!(k, result_count = results.len(), "retrieval completed");
        Ok(results)
    }
}
