//! # pdfchat-rag
//!
//! Retrieval primitives for the pdfchat assistant.
//!
//! ## Overview
//!
//! - [`RecursiveChunker`] - splits extracted text into overlapping chunks
//! - [`EmbeddingProvider`] - maps text to vectors (OpenAI / Azure OpenAI behind `openai`)
//! - [`VectorIndex`] - keyed similarity index ([`InMemoryVectorStore`], `SqliteVectorStore`)
//! - [`Retriever`] - embeds a query and returns the nearest passages
//! - [`format_citations`] - turns retrieval results into a deduplicated citation list
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pdfchat_rag::{Chunker, InMemoryVectorStore, IndexedRecord, RecursiveChunker, Retriever};
//!
//! let chunks = RecursiveChunker::default().chunk(&text, "report.pdf")?;
//! let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
//! let vectors = embedder.embed_batch(&texts).await?;
//! let records: Vec<IndexedRecord> =
//!     chunks.into_iter().zip(vectors).map(|(c, v)| IndexedRecord::from_chunk(c, v)).collect();
//!
//! let index = Arc::new(InMemoryVectorStore::new());
//! index.upsert(&records).await?;
//! let results = Retriever::new(embedder, index).retrieve("what is in the report?", 5).await?;
//! ```

pub mod chunking;
pub mod citation;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
#[cfg(feature = "openai")]
pub mod openai;
pub mod retriever;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod vectorstore;

pub use chunking::{Chunker, RecursiveChunker, TextSpan, split_text};
pub use citation::format_citations;
pub use config::RagConfig;
pub use document::{
    Chunk, ChunkMetadata, Citation, IndexedRecord, MetadataFilter, RetrievalResult, RetrievedChunk,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
#[cfg(feature = "openai")]
pub use openai::{AzureOpenAIEmbeddingProvider, OpenAIEmbeddingProvider};
pub use retriever::Retriever;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteVectorStore;
pub use vectorstore::VectorIndex;
