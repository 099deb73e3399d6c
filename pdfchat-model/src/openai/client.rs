//! OpenAI client implementation.

use super::config::{AzureConfig, OpenAIConfig};
use crate::error::{ModelError, Result};
use crate::provider::CompletionProvider;
use async_openai::{
    Client,
    config::{AzureConfig as AsyncAzureConfig, Config, OpenAIConfig as AsyncOpenAIConfig},
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use tracing::{debug, error};

/// OpenAI client for standard OpenAI API and OpenAI-compatible APIs.
pub struct OpenAIClient {
    client: Client<AsyncOpenAIConfig>,
    model: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        config.validate()?;
        let mut openai_config = AsyncOpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(org_id) = &config.organization_id {
            openai_config = openai_config.with_org_id(org_id);
        }

        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Ok(Self { client: Client::with_config(openai_config), model: config.model })
    }

    /// Create a client for an OpenAI-compatible API.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        Self::new(OpenAIConfig::compatible(api_key, base_url, model))
    }
}

#[async_trait]
impl CompletionProvider for OpenAIClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        send_completion(&self.client, "OpenAI", &self.model, prompt, temperature).await
    }
}

/// Azure OpenAI client.
pub struct AzureOpenAIClient {
    client: Client<AsyncAzureConfig>,
    deployment_id: String,
}

impl AzureOpenAIClient {
    /// Create a new Azure OpenAI client.
    pub fn new(config: AzureConfig) -> Result<Self> {
        config.validate()?;
        let azure_config = AsyncAzureConfig::new()
            .with_api_base(&config.api_base)
            .with_api_version(&config.api_version)
            .with_deployment_id(&config.deployment_id)
            .with_api_key(&config.api_key);

        Ok(Self { client: Client::with_config(azure_config), deployment_id: config.deployment_id })
    }
}

#[async_trait]
impl CompletionProvider for AzureOpenAIClient {
    fn name(&self) -> &str {
        &self.deployment_id
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        // Azure routes by deployment; the model field only has to be non-empty.
        send_completion(&self.client, "Azure OpenAI", &self.deployment_id, prompt, temperature)
            .await
    }
}

async fn send_completion<C: Config>(
    client: &Client<C>,
    provider: &str,
    model: &str,
    prompt: &str,
    temperature: f32,
) -> Result<String> {
    let message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
        .content(prompt)
        .build()
        .map_err(|e| ModelError::completion(provider, format!("Failed to build request: {e}")))?
        .into();

    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(vec![message])
        .temperature(temperature)
        .build()
        .map_err(|e| ModelError::completion(provider, format!("Failed to build request: {e}")))?;

    let response = client.chat().create(request).await.map_err(|e| {
        error!(provider, model, error = %e, "chat completion request failed");
        ModelError::completion(provider, format!("{provider} API error: {e}"))
    })?;

    let answer = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ModelError::completion(provider, "empty completion"))?;

    debug!(provider, model, answer_chars = answer.chars().count(), "chat completion received");
    Ok(answer)
}
