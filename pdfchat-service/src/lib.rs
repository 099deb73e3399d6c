//! # pdfchat-service
//!
//! The retrieval-augmented chat service behind pdfchat.
//!
//! [`ChatService`] ties the pieces together: uploaded files are extracted,
//! chunked, embedded and indexed; chat messages are optionally grounded in
//! the nearest indexed passages, answered by a completion provider, and
//! returned with one citation per source document.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pdfchat_service::{AppConfig, ChatRequest, ChatService};
//!
//! let config = AppConfig::from_env()?;
//! let service = ChatService::from_config(&config).await?;
//!
//! service.ingest(&std::fs::read("handbook.pdf")?, "handbook.pdf").await?;
//! let reply = service.chat(ChatRequest::new("How many vacation days do I get?")).await?;
//! for citation in &reply.citations {
//!     println!("{}: {}", citation.source, citation.content);
//! }
//! ```
//!
//! ## Testing without network access
//!
//! Build the service with [`ChatService::builder`] and inject a deterministic
//! [`EmbeddingProvider`](pdfchat_rag::EmbeddingProvider) and
//! [`MockLlm`](pdfchat_model::MockLlm).

#[cfg(feature = "openai")]
mod bootstrap;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod generator;
mod lock;
pub mod retry;
pub mod service;
pub mod types;

pub use config::{AppConfig, ProviderConfig};
pub use context::{ContextAssembler, Prompt, PromptMode};
pub use error::{Result, ServiceError};
pub use extract::{ExtractorRegistry, PlainTextExtractor, TextExtractor};
#[cfg(feature = "pdf")]
pub use extract::PdfTextExtractor;
pub use generator::AnswerGenerator;
pub use retry::RetryPolicy;
pub use service::{ChatService, ChatServiceBuilder};
pub use types::{
    ChatRequest, ChatResponse, DEFAULT_CONVERSATION_ID, DeleteReport, DocumentSummary,
    HealthReport, IngestReport,
};
