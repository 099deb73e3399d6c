//! Error types for the `pdfchat-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval and grounding operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The text handed to the chunker was empty or whitespace-only.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A configuration validation error (e.g. `chunk_overlap >= chunk_size`).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The embedding provider failed.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
        /// Whether the failure is transient (timeout, rate limit, 5xx).
        retryable: bool,
    },

    /// The vector index storage could not be opened.
    #[error("Vector index unavailable ({backend}): {message}")]
    IndexUnavailable {
        /// The vector store backend that could not be opened.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An operation against an open vector store failed.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector with the wrong dimensionality was handed to the index.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of vectors already held by the index.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },
}

impl RagError {
    /// Build a non-transient embedding error.
    pub fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingError { provider: provider.into(), message: message.into(), retryable: false }
    }

    /// Build a transient embedding error that a caller may retry.
    pub fn embedding_transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingError { provider: provider.into(), message: message.into(), retryable: true }
    }

    /// Returns `true` if retrying the failed call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EmbeddingError { retryable: true, .. })
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
