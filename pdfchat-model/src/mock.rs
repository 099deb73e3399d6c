//! Scripted completion provider for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ModelError, Result};
use crate::provider::CompletionProvider;

/// A recorded call to [`MockLlm::complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPrompt {
    pub prompt: String,
    pub temperature: f32,
}

enum Reply {
    Text(String),
    Failure(String),
}

/// A [`CompletionProvider`] that replays queued replies and records every
/// prompt it was given.
///
/// When the queue is empty it falls back to the default reply set with
/// [`MockLlm::with_response`], or to a fixed placeholder.
pub struct MockLlm {
    name: String,
    default_reply: String,
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<RecordedPrompt>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            name: "mock-model".to_string(),
            default_reply: "I'm a mock LLM. No queued responses available.".to_string(),
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A mock that answers every call with `text`.
    pub fn with_response(text: impl Into<String>) -> Self {
        Self { default_reply: text.into(), ..Self::new() }
    }

    /// Queue `text` as the reply to the next unanswered call.
    pub fn queue_response(&self, text: impl Into<String>) {
        self.lock_replies().push_back(Reply::Text(text.into()));
    }

    /// Make the next unanswered call fail with a completion error.
    pub fn queue_failure(&self, message: impl Into<String>) {
        self.lock_replies().push_back(Reply::Failure(message.into()));
    }

    /// Every prompt received so far, oldest first.
    pub fn prompts(&self) -> Vec<RecordedPrompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// The most recent prompt text, if any.
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts().pop().map(|p| p.prompt)
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Reply>> {
        self.replies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(RecordedPrompt { prompt: prompt.to_string(), temperature });
        }

        match self.lock_replies().pop_front() {
            Some(Reply::Text(text)) if text.trim().is_empty() => {
                Err(ModelError::completion(&self.name, "empty completion"))
            }
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Failure(message)) => Err(ModelError::completion(&self.name, message)),
            None => Ok(self.default_reply.clone()),
        }
    }
}
