//! Data types for chunks, indexed records, retrieval results, and citations.

use serde::{Deserialize, Serialize};

/// Positional metadata attached to every chunk of a source document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Identifier of the source document (the uploaded filename).
    pub source_document: String,
    /// Zero-based position of the chunk within its document.
    pub chunk_index: usize,
    /// Number of chunks the document was split into.
    pub total_chunks: usize,
    /// Byte offset of the chunk's first character in the extracted text.
    #[serde(default)]
    pub start_offset: usize,
    /// Byte offset one past the chunk's last character in the extracted text.
    #[serde(default)]
    pub end_offset: usize,
}

/// A bounded-size text segment of a source document.
///
/// Chunks are produced by a [`Chunker`](crate::chunking::Chunker) and never
/// change afterwards; replacing a document replaces all of its chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Opaque unique identifier.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Positional metadata.
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// The identifier of the document this chunk belongs to.
    pub fn source_document(&self) -> &str {
        &self.metadata.source_document
    }
}

/// A chunk together with its embedding, as held by a vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedRecord {
    /// Same as the originating [`Chunk::id`].
    pub id: String,
    /// The vector embedding of `text`.
    pub embedding: Vec<f32>,
    /// The chunk text.
    pub text: String,
    /// Positional metadata copied from the chunk.
    pub metadata: ChunkMetadata,
}

impl IndexedRecord {
    /// Pair a chunk with its embedding.
    pub fn from_chunk(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self { id: chunk.id, embedding, text: chunk.text, metadata: chunk.metadata }
    }
}

/// The text and metadata of a retrieved record (the embedding is not returned).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    /// Record identifier.
    pub id: String,
    /// The chunk text.
    pub text: String,
    /// Positional metadata.
    pub metadata: ChunkMetadata,
}

/// One hit from a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    /// The retrieved chunk.
    pub chunk: RetrievedChunk,
    /// Cosine distance to the query in `[0, 1]`, lower is closer. `None` when
    /// the backend did not report a distance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    /// Zero-based position in the result list.
    pub rank: usize,
}

impl RetrievalResult {
    /// The identifier of the document the hit came from.
    pub fn source_document(&self) -> &str {
        &self.chunk.metadata.source_document
    }
}

/// A user-facing reference to a source document backing an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// The source document identifier.
    pub source: String,
    /// The first 200 characters of the cited passage followed by `"..."`.
    pub content: String,
    /// `1 - distance` when the distance is known.
    pub relevance_score: Option<f32>,
}

/// A predicate over record metadata used by
/// [`VectorIndex::delete_where`](crate::vectorstore::VectorIndex::delete_where).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataFilter {
    /// Matches every record of the named source document.
    SourceDocument(String),
}

impl MetadataFilter {
    /// Returns `true` if `metadata` satisfies the filter.
    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        match self {
            Self::SourceDocument(name) => metadata.source_document == *name,
        }
    }
}
