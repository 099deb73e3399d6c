//! Building a [`ChatService`] from an [`AppConfig`].

use std::sync::Arc;

use pdfchat_model::CompletionProvider;
use pdfchat_model::openai::{AzureConfig, AzureOpenAIClient, OpenAIClient, OpenAIConfig};
use pdfchat_rag::{
    AzureOpenAIEmbeddingProvider, EmbeddingProvider, InMemoryVectorStore, OpenAIEmbeddingProvider,
    VectorIndex,
};
use pdfchat_session::{ConversationStore, InMemoryConversationStore};
use tracing::info;

use crate::config::{AppConfig, ProviderConfig};
use crate::error::Result;
use crate::service::ChatService;

impl ProviderConfig {
    pub fn embedding_provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        Ok(match self {
            ProviderConfig::Azure { endpoint, api_key, api_version, embedding_deployment, .. } => {
                Arc::new(
                    AzureOpenAIEmbeddingProvider::new(endpoint, api_key, embedding_deployment)?
                        .with_api_version(api_version),
                )
            }
            ProviderConfig::OpenAI { api_key, embedding_model, .. } => {
                Arc::new(OpenAIEmbeddingProvider::new(api_key)?.with_model(embedding_model))
            }
        })
    }

    pub fn completion_provider(&self) -> Result<Arc<dyn CompletionProvider>> {
        Ok(match self {
            ProviderConfig::Azure { endpoint, api_key, api_version, chat_deployment, .. } => {
                let config = AzureConfig::new(endpoint, api_key, chat_deployment)
                    .with_api_version(api_version);
                Arc::new(AzureOpenAIClient::new(config)?)
            }
            ProviderConfig::OpenAI { api_key, chat_model, .. } => {
                Arc::new(OpenAIClient::new(OpenAIConfig::new(api_key, chat_model))?)
            }
        })
    }
}

impl ChatService {
    /// Open the configured index and conversation store and connect the
    /// configured provider.
    ///
    /// # Errors
    ///
    /// [`ServiceError::IndexUnavailable`](crate::ServiceError::IndexUnavailable)
    /// when the index file cannot be opened; the caller should treat this as
    /// fatal.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        info!(provider = config.provider.name(), collection = %config.collection_name, "starting chat service");

        Self::builder()
            .embedding_provider(config.provider.embedding_provider()?)
            .completion_provider(config.provider.completion_provider()?)
            .vector_index(open_index(config).await?)
            .conversation_store(open_conversations(config).await?)
            .rag_config(config.rag.clone())
            .temperature(config.temperature)
            .history_turns(config.history_turns)
            .build()
    }
}

async fn open_index(config: &AppConfig) -> Result<Arc<dyn VectorIndex>> {
    match &config.index_path {
        None => Ok(Arc::new(InMemoryVectorStore::new())),
        #[cfg(feature = "sqlite")]
        Some(path) => Ok(Arc::new(
            pdfchat_rag::SqliteVectorStore::open(path, &config.collection_name).await?,
        )),
        #[cfg(not(feature = "sqlite"))]
        Some(path) => Err(crate::error::ServiceError::InvalidConfiguration(format!(
            "index path {} requires the `sqlite` feature",
            path.display()
        ))),
    }
}

async fn open_conversations(config: &AppConfig) -> Result<Arc<dyn ConversationStore>> {
    match &config.conversation_db {
        None => Ok(Arc::new(InMemoryConversationStore::new())),
        #[cfg(feature = "database")]
        Some(path) => Ok(Arc::new(pdfchat_session::SqliteConversationStore::open(path).await?)),
        #[cfg(not(feature = "database"))]
        Some(path) => Err(crate::error::ServiceError::InvalidConfiguration(format!(
            "conversation database {} requires the `database` feature",
            path.display()
        ))),
    }
}
