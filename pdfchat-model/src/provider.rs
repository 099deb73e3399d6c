use async_trait::async_trait;

use crate::error::Result;

/// Sampling temperature used when the caller does not choose one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// A chat-completion service.
///
/// One call sends the whole prompt as a single user message and waits for
/// the full answer; there is no streaming and no retry. An empty answer is a
/// [`ModelError::CompletionService`](crate::ModelError::CompletionService).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Model or deployment name, for logs.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;
}
