//! OpenAI and Azure OpenAI chat completion via `async-openai`.

mod client;
mod config;

pub use client::{AzureOpenAIClient, OpenAIClient};
pub use config::{AzureConfig, DEFAULT_AZURE_API_VERSION, DEFAULT_CHAT_MODEL, OpenAIConfig};
