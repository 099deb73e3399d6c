//! Environment-driven configuration.
//!
//! Variables (a `.env` file in the working directory is honoured):
//!
//! | Variable | Default |
//! |----------|---------|
//! | `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_API_KEY` | unset; Azure is used when both are set |
//! | `OPENAI_API_KEY` | unset; used when Azure is not configured |
//! | `API_VERSION` | `2024-12-01-preview` |
//! | `EMBEDDING_MODEL` | `text-embedding-ada-002` |
//! | `CHAT_MODEL` / `AZURE_CHAT_MODEL` | `gpt-4` |
//! | `COLLECTION_NAME` | `pdfchat_documents` |
//! | `PDFCHAT_INDEX_PATH` | `./pdfchat_data/index.db` (`:memory:` for a private in-memory index) |
//! | `PDFCHAT_CHUNK_SIZE` / `PDFCHAT_CHUNK_OVERLAP` / `PDFCHAT_TOP_K` | 1000 / 200 / 5 |
//! | `PDFCHAT_TEMPERATURE` | 0.7 |
//! | `PDFCHAT_HISTORY_TURNS` | 6 |
//! | `PDFCHAT_CONVERSATION_DB` | unset (conversations kept in memory) |
//! | `PDFCHAT_LOG_FORMAT` | `text` |

use std::path::PathBuf;
use std::str::FromStr;

use pdfchat_model::DEFAULT_TEMPERATURE;
use pdfchat_rag::RagConfig;
use pdfchat_session::DEFAULT_HISTORY_TURNS;
use pdfchat_telemetry::LogFormat;
use tracing::info;

use crate::error::{Result, ServiceError};

pub const DEFAULT_API_VERSION: &str = "2024-12-01-preview";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";
pub const DEFAULT_COLLECTION_NAME: &str = "pdfchat_documents";
pub const DEFAULT_INDEX_PATH: &str = "./pdfchat_data/index.db";

/// Index path value that selects a non-persistent index.
pub const IN_MEMORY_INDEX: &str = ":memory:";

/// Which hosted service supplies embeddings and completions.
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    Azure {
        endpoint: String,
        api_key: String,
        api_version: String,
        /// Deployment name used for embeddings.
        embedding_deployment: String,
        /// Deployment name used for chat completions.
        chat_deployment: String,
    },
    OpenAI {
        api_key: String,
        embedding_model: String,
        chat_model: String,
    },
}

impl ProviderConfig {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderConfig::Azure { .. } => "Azure OpenAI",
            ProviderConfig::OpenAI { .. } => "OpenAI",
        }
    }
}

// Keys stay out of logs and panics.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Azure { endpoint, api_version, embedding_deployment, chat_deployment, .. } => f
                .debug_struct("Azure")
                .field("endpoint", endpoint)
                .field("api_key", &"<redacted>")
                .field("api_version", api_version)
                .field("embedding_deployment", embedding_deployment)
                .field("chat_deployment", chat_deployment)
                .finish(),
            ProviderConfig::OpenAI { embedding_model, chat_model, .. } => f
                .debug_struct("OpenAI")
                .field("api_key", &"<redacted>")
                .field("embedding_model", embedding_model)
                .field("chat_model", chat_model)
                .finish(),
        }
    }
}

/// Everything needed to build a [`ChatService`](crate::ChatService).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub collection_name: String,
    /// `None` selects an in-memory index.
    pub index_path: Option<PathBuf>,
    pub rag: RagConfig,
    pub temperature: f32,
    pub history_turns: usize,
    /// SQLite file for conversation history; `None` keeps it in memory.
    pub conversation_db: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            info!(path = %path.display(), "loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let embedding_model = or_default("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL);
        let provider = match (var("AZURE_OPENAI_ENDPOINT"), var("AZURE_OPENAI_API_KEY")) {
            (Some(endpoint), Some(api_key)) => ProviderConfig::Azure {
                endpoint,
                api_key,
                api_version: or_default("API_VERSION", DEFAULT_API_VERSION),
                embedding_deployment: embedding_model,
                chat_deployment: or_default("AZURE_CHAT_MODEL", DEFAULT_CHAT_MODEL),
            },
            _ => match var("OPENAI_API_KEY") {
                Some(api_key) => ProviderConfig::OpenAI {
                    api_key,
                    embedding_model,
                    chat_model: or_default("CHAT_MODEL", DEFAULT_CHAT_MODEL),
                },
                None => {
                    return Err(ServiceError::InvalidConfiguration(
                        "no model provider configured: set AZURE_OPENAI_ENDPOINT and \
                         AZURE_OPENAI_API_KEY, or OPENAI_API_KEY"
                            .to_string(),
                    ));
                }
            },
        };

        let defaults = RagConfig::default();
        let rag = RagConfig::builder()
            .chunk_size(parse_var(&var, "PDFCHAT_CHUNK_SIZE", defaults.chunk_size)?)
            .chunk_overlap(parse_var(&var, "PDFCHAT_CHUNK_OVERLAP", defaults.chunk_overlap)?)
            .top_k(parse_var(&var, "PDFCHAT_TOP_K", defaults.top_k)?)
            .build()?;

        let index_path = match or_default("PDFCHAT_INDEX_PATH", DEFAULT_INDEX_PATH) {
            path if path == IN_MEMORY_INDEX => None,
            path => Some(PathBuf::from(path)),
        };

        let config = Self {
            provider,
            collection_name: or_default("COLLECTION_NAME", DEFAULT_COLLECTION_NAME),
            index_path,
            rag,
            temperature: parse_var(&var, "PDFCHAT_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            history_turns: parse_var(&var, "PDFCHAT_HISTORY_TURNS", DEFAULT_HISTORY_TURNS)?,
            conversation_db: var("PDFCHAT_CONVERSATION_DB").map(PathBuf::from),
            log_format: parse_var(&var, "PDFCHAT_LOG_FORMAT", LogFormat::Text)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.rag.validate()?;
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ServiceError::InvalidConfiguration(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if self.collection_name.trim().is_empty() {
            return Err(ServiceError::InvalidConfiguration(
                "collection name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T, V>(var: &V, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e| {
            ServiceError::InvalidConfiguration(format!("{key}={raw:?} is invalid: {e}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn azure_wins_when_endpoint_and_key_are_set() {
        let config = config_from(&[
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"),
            ("AZURE_OPENAI_API_KEY", "azure-key"),
            ("OPENAI_API_KEY", "sk-ignored"),
            ("AZURE_CHAT_MODEL", "gpt-4o"),
        ])
        .unwrap();

        match config.provider {
            ProviderConfig::Azure { api_version, chat_deployment, embedding_deployment, .. } => {
                assert_eq!(api_version, DEFAULT_API_VERSION);
                assert_eq!(chat_deployment, "gpt-4o");
                assert_eq!(embedding_deployment, DEFAULT_EMBEDDING_MODEL);
            }
            other => panic!("expected Azure, got {other:?}"),
        }
    }

    #[test]
    fn openai_is_the_fallback_with_defaults() {
        let config = config_from(&[
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap();

        assert_eq!(config.provider.name(), "OpenAI");
        assert_eq!(config.rag, RagConfig::default());
        assert_eq!(config.history_turns, 6);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.collection_name, DEFAULT_COLLECTION_NAME);
        assert_eq!(config.index_path, Some(PathBuf::from(DEFAULT_INDEX_PATH)));
        assert!(config.conversation_db.is_none());
    }

    #[test]
    fn missing_credentials_are_a_configuration_error() {
        let err = config_from(&[]).unwrap_err();
        assert_eq!(err.category(), "invalid_configuration");
    }

    #[test]
    fn numeric_overrides_are_parsed_and_validated() {
        let config = config_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("PDFCHAT_CHUNK_SIZE", "500"),
            ("PDFCHAT_CHUNK_OVERLAP", "50"),
            ("PDFCHAT_INDEX_PATH", ":memory:"),
            ("PDFCHAT_LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.rag.chunk_size, 500);
        assert_eq!(config.rag.chunk_overlap, 50);
        assert!(config.index_path.is_none());
        assert_eq!(config.log_format, LogFormat::Json);

        let err = config_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("PDFCHAT_CHUNK_SIZE", "100"),
            ("PDFCHAT_CHUNK_OVERLAP", "100"),
        ])
        .unwrap_err();
        assert_eq!(err.category(), "invalid_configuration");

        let err =
            config_from(&[("OPENAI_API_KEY", "sk-test"), ("PDFCHAT_TOP_K", "many")]).unwrap_err();
        assert!(err.to_string().contains("PDFCHAT_TOP_K"));
    }

    #[test]
    fn debug_output_hides_keys() {
        let config = config_from(&[("OPENAI_API_KEY", "sk-secret")]).unwrap();
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
