//! Request and response types of the service interface.

use pdfchat_rag::Citation;
use serde::{Deserialize, Serialize};

/// Conversation used when a request does not name one.
pub const DEFAULT_CONVERSATION_ID: &str = "default";

fn default_conversation_id() -> String {
    DEFAULT_CONVERSATION_ID.to_string()
}

fn default_use_context() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_conversation_id")]
    pub conversation_id: String,
    /// Retrieve passages from indexed documents before answering.
    #[serde(default = "default_use_context")]
    pub use_context: bool,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: default_conversation_id(),
            use_context: true,
        }
    }

    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    pub fn without_context(mut self) -> Self {
        self.use_context = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub citations: Vec<Citation>,
    pub conversation_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub filename: String,
    pub chunks_added: usize,
    /// Always `"success"`.
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub filename: String,
    pub chunks_deleted: usize,
    /// Always `"deleted"`.
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub filename: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// `"healthy"` when the index answered, otherwise `"degraded"`.
    pub status: String,
    pub index_reachable: bool,
    pub indexed_chunks: usize,
    pub conversations: usize,
    pub embedding_provider: String,
    pub completion_provider: String,
}
