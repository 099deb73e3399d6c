//! Error taxonomy exposed by [`ChatService`](crate::ChatService).

use pdfchat_model::ModelError;
use pdfchat_rag::RagError;
use pdfchat_session::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Text to chunk, or a question, was empty.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The uploaded file's extension has no registered extractor.
    #[error("Unsupported file type: {filename} (supported: {supported})")]
    UnsupportedFileType { filename: String, supported: String },

    #[error("File is empty: {0}")]
    EmptyFile(String),

    /// Text could not be pulled out of the uploaded bytes, or none was found.
    #[error("Failed to extract text from {filename}: {message}")]
    Extraction { filename: String, message: String },

    #[error("Embedding service error ({provider}): {message}")]
    EmbeddingService { provider: String, message: String },

    #[error("Completion service error ({provider}): {message}")]
    CompletionService { provider: String, message: String },

    /// The similarity index could not be opened.
    #[error("Vector index unavailable ({backend}): {message}")]
    IndexUnavailable { backend: String, message: String },

    /// A read or write against an open index or conversation store failed.
    #[error("Index operation failed ({backend}): {message}")]
    IndexOperation { backend: String, message: String },

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },
}

impl ServiceError {
    pub fn document_not_found(filename: impl Into<String>) -> Self {
        Self::NotFound { kind: "Document", name: filename.into() }
    }

    pub fn conversation_not_found(id: impl Into<String>) -> Self {
        Self::NotFound { kind: "Conversation", name: id.into() }
    }

    /// Stable machine-readable category, suitable for mapping to status codes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::EmptyInput(_) => "empty_input",
            Self::InvalidConfiguration(_) => "invalid_configuration",
            Self::UnsupportedFileType { .. } => "unsupported_file_type",
            Self::EmptyFile(_) => "empty_file",
            Self::Extraction { .. } => "extraction",
            Self::EmbeddingService { .. } => "embedding_service",
            Self::CompletionService { .. } => "completion_service",
            Self::IndexUnavailable { .. } => "index_unavailable",
            Self::IndexOperation { .. } => "index_operation",
            Self::NotFound { .. } => "not_found",
        }
    }

    /// Whether the caller sent something unusable, as opposed to a
    /// collaborator or storage failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput(_)
                | Self::UnsupportedFileType { .. }
                | Self::EmptyFile(_)
                | Self::Extraction { .. }
                | Self::NotFound { .. }
        )
    }
}

impl From<RagError> for ServiceError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::EmptyInput(message) => Self::EmptyInput(message),
            RagError::InvalidConfiguration(message) => Self::InvalidConfiguration(message),
            RagError::EmbeddingError { provider, message, .. } => {
                Self::EmbeddingService { provider, message }
            }
            RagError::IndexUnavailable { backend, message } => {
                Self::IndexUnavailable { backend, message }
            }
            RagError::VectorStoreError { backend, message } => {
                Self::IndexOperation { backend, message }
            }
            err @ RagError::DimensionMismatch { .. } => {
                Self::IndexOperation { backend: "vector index".to_string(), message: err.to_string() }
            }
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::CompletionService { provider, message } => {
                Self::CompletionService { provider, message }
            }
            ModelError::InvalidConfiguration(message) => Self::InvalidConfiguration(message),
        }
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => Self::conversation_not_found(id),
            SessionError::Unavailable { backend, message } => {
                Self::IndexUnavailable { backend, message }
            }
            SessionError::Storage { backend, message } => Self::IndexOperation { backend, message },
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rag_errors_map_to_service_categories() {
        let err: ServiceError = RagError::embedding_transient("OpenAI", "timed out").into();
        assert_eq!(err.category(), "embedding_service");

        let err: ServiceError = RagError::DimensionMismatch { expected: 2, actual: 3 }.into();
        assert_eq!(err.category(), "index_operation");
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn not_found_names_the_missing_thing() {
        let err = ServiceError::document_not_found("report.pdf");
        assert_eq!(err.to_string(), "Document not found: report.pdf");
        assert_eq!(err.category(), "not_found");
        assert!(err.is_client_error());
        assert!(!ServiceError::from(ModelError::completion("mock", "down")).is_client_error());
    }
}
