//! Connection settings for the OpenAI and Azure OpenAI clients.

use crate::error::{ModelError, Result};

/// Chat model used when none is configured.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";

/// Azure OpenAI REST API version used when none is configured.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-12-01-preview";

/// Settings for the public OpenAI API or an OpenAI-compatible server.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    pub organization_id: Option<String>,
    pub base_url: Option<String>,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            organization_id: None,
            base_url: None,
        }
    }

    /// Settings for an OpenAI-compatible endpoint at `base_url`.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self { base_url: Some(base_url.into()), ..Self::new(api_key, model) }
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ModelError::InvalidConfiguration("OpenAI API key is empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(ModelError::InvalidConfiguration("OpenAI model name is empty".into()));
        }
        Ok(())
    }
}

/// Settings for an Azure OpenAI chat deployment.
#[derive(Debug, Clone)]
pub struct AzureConfig {
    pub api_base: String,
    pub api_key: String,
    pub api_version: String,
    pub deployment_id: String,
}

impl AzureConfig {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        deployment_id: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            deployment_id: deployment_id.into(),
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let required = [
            ("endpoint", &self.api_base),
            ("API key", &self.api_key),
            ("deployment", &self.deployment_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ModelError::InvalidConfiguration(format!(
                    "Azure OpenAI {field} is empty"
                )));
            }
        }
        Ok(())
    }
}
