//! Errors raised by completion providers.

use thiserror::Error;

/// Failure of a [`CompletionProvider`](crate::CompletionProvider) call or its setup.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The completion service failed or returned nothing usable.
    #[error("Completion service error ({provider}): {message}")]
    CompletionService { provider: String, message: String },

    /// Client configuration was rejected before any request was sent.
    #[error("Invalid model configuration: {0}")]
    InvalidConfiguration(String),
}

impl ModelError {
    /// Build a [`ModelError::CompletionService`].
    pub fn completion(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CompletionService { provider: provider.into(), message: message.into() }
    }
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
