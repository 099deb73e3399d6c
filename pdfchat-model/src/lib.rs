//! # pdfchat-model
//!
//! Chat-completion providers for pdfchat.
//!
//! ## Overview
//!
//! - [`OpenAIClient`] - OpenAI models (GPT-4, GPT-4o, etc.) and OpenAI-compatible servers
//! - [`AzureOpenAIClient`] - Azure OpenAI Service deployments
//! - [`MockLlm`] - scripted provider for testing
//!
//! All of them implement [`CompletionProvider`]: one prompt in, one answer out.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pdfchat_model::openai::{OpenAIClient, OpenAIConfig};
//! use pdfchat_model::CompletionProvider;
//!
//! let model = OpenAIClient::new(OpenAIConfig::new(
//!     std::env::var("OPENAI_API_KEY")?,
//!     "gpt-4",
//! ))?;
//! let answer = model.complete("Summarise the attached notes.", 0.7).await?;
//! ```

pub mod error;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
pub mod provider;

pub use error::{ModelError, Result};
pub use mock::{MockLlm, RecordedPrompt};
#[cfg(feature = "openai")]
pub use openai::{AzureOpenAIClient, OpenAIClient};
pub use provider::{CompletionProvider, DEFAULT_TEMPERATURE};
