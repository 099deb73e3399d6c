//! Deterministic collaborators for service tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pdfchat_model::MockLlm;
use pdfchat_rag::embedding::normalize;
use pdfchat_rag::{
    EmbeddingProvider, InMemoryVectorStore, IndexedRecord, MetadataFilter, RagConfig, RagError,
    RetrievalResult, VectorIndex,
};
use pdfchat_service::{ChatService, ChatServiceBuilder, RetryPolicy, TextExtractor};

pub const DIMENSIONS: usize = 512;

/// Hashes each lowercase word into a bucket, so texts sharing words land close together.
pub struct BagOfWordsEmbedder;

pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIMENSIONS];
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        vector[(hash % DIMENSIONS as u64) as usize] += 1.0;
    }
    normalize(&mut vector);
    vector
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed_one(&self, text: &str) -> pdfchat_rag::Result<Vec<f32>> {
        Ok(bag_of_words(text))
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn name(&self) -> &str {
        "bag-of-words"
    }
}

/// Fails the first `failures` batch calls, transiently or permanently.
pub struct FlakyEmbedder {
    failures: usize,
    transient: bool,
    pub batch_calls: AtomicUsize,
}

impl FlakyEmbedder {
    pub fn transient(failures: usize) -> Self {
        Self { failures, transient: true, batch_calls: AtomicUsize::new(0) }
    }

    pub fn permanent() -> Self {
        Self { failures: usize::MAX, transient: false, batch_calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    async fn embed_one(&self, text: &str) -> pdfchat_rag::Result<Vec<f32>> {
        Ok(bag_of_words(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> pdfchat_rag::Result<Vec<Vec<f32>>> {
        let call = self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(if self.transient {
                RagError::embedding_transient("flaky", "503 Service Unavailable")
            } else {
                RagError::embedding("flaky", "401 Unauthorized")
            });
        }
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }
}

/// Stands in for a PDF parser: the "PDF" bytes are UTF-8 text.
pub struct FakePdfExtractor;

#[async_trait]
impl TextExtractor for FakePdfExtractor {
    async fn extract(&self, bytes: &[u8], _filename: &str) -> pdfchat_service::Result<String> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// An in-memory index whose writes can be switched to fail.
#[derive(Default)]
pub struct FailingWritesIndex {
    inner: InMemoryVectorStore,
    pub fail_writes: AtomicBool,
}

impl FailingWritesIndex {
    fn check_writable(&self) -> pdfchat_rag::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RagError::VectorStoreError {
                backend: "failing".to_string(),
                message: "disk full".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for FailingWritesIndex {
    async fn upsert(&self, records: &[IndexedRecord]) -> pdfchat_rag::Result<()> {
        self.check_writable()?;
        self.inner.upsert(records).await
    }

    async fn query(&self, embedding: &[f32], k: usize) -> pdfchat_rag::Result<Vec<RetrievalResult>> {
        self.inner.query(embedding, k).await
    }

    async fn delete_where(&self, filter: &MetadataFilter) -> pdfchat_rag::Result<usize> {
        self.check_writable()?;
        self.inner.delete_where(filter).await
    }

    async fn replace_where(
        &self,
        filter: &MetadataFilter,
        records: &[IndexedRecord],
    ) -> pdfchat_rag::Result<usize> {
        self.check_writable()?;
        self.inner.replace_where(filter, records).await
    }

    async fn list_all(&self) -> pdfchat_rag::Result<Vec<IndexedRecord>> {
        self.inner.list_all().await
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
    }
}

pub fn builder(llm: Arc<MockLlm>) -> ChatServiceBuilder {
    ChatService::builder()
        .embedding_provider(Arc::new(BagOfWordsEmbedder))
        .completion_provider(llm)
        .extractor("pdf", Arc::new(FakePdfExtractor))
        .retry_policy(fast_retry())
}

pub fn service(llm: Arc<MockLlm>) -> ChatService {
    builder(llm).build().unwrap()
}

pub fn small_chunks() -> RagConfig {
    RagConfig::builder().chunk_size(120).chunk_overlap(20).top_k(5).build().unwrap()
}

pub const RUST_DOC: &str = "Rust enforces ownership through the borrow checker. \
Every value has a single owner and references must not outlive it.";

pub const PYTHON_DOC: &str = "Python manages memory with reference counting and a cyclic \
garbage collector inside the interpreter.";
