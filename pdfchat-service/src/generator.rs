use std::sync::Arc;

use pdfchat_model::{CompletionProvider, DEFAULT_TEMPERATURE};
use tracing::{debug, error};

use crate::context::Prompt;
use crate::error::Result;

/// Sends assembled prompts to a completion provider.
#[derive(Clone)]
pub struct AnswerGenerator {
    provider: Arc<dyn CompletionProvider>,
    temperature: f32,
}

impl AnswerGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider, temperature: DEFAULT_TEMPERATURE }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// One completion call with the whole prompt; failures are not retried.
    pub async fn generate(&self, prompt: &Prompt) -> Result<String> {
        debug!(
            model = %self.provider.name(),
            mode = ?prompt.mode,
            prompt_chars = prompt.text.chars().count(),
            "requesting completion"
        );
        let answer = self.provider.complete(&prompt.text, self.temperature).await.map_err(|e| {
            error!(model = %self.provider.name(), error = %e, "completion failed");
            e
        })?;
        Ok(answer)
    }
}
