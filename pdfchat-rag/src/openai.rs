//! OpenAI and Azure OpenAI embedding providers.
//!
//! This module is only available when the `openai` feature is enabled.
//! Both providers call the embeddings REST endpoint directly with `reqwest`
//! and differ only in URL layout and authentication header.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default OpenAI API base URL.
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// The default model for embeddings.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// The dimensionality of `text-embedding-ada-002`.
pub const DEFAULT_DIMENSIONS: usize = 1536;

/// The default Azure OpenAI REST API version.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-12-01-preview";

/// Most inputs sent in one embeddings request. The APIs reject more than 2048.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Per-request timeout, after which the call fails as a transient error.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

fn http_client(provider: &str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RagError::embedding(provider, format!("failed to build HTTP client: {e}")))
}

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new("sk-...")?;
/// let embedding = provider.embed_one("hello world").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    dimensions: usize,
    max_batch_size: usize,
}

impl OpenAIEmbeddingProvider {
    /// Create a new provider with the given API key.
    ///
    /// Uses the default model (`text-embedding-ada-002`) and dimensions (1536).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::embedding("OpenAI", "API key must not be empty"));
        }

        Ok(Self {
            client: http_client("OpenAI", DEFAULT_REQUEST_TIMEOUT)?,
            api_key,
            api_base: OPENAI_API_BASE.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        })
    }

    /// Create a new provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| RagError::embedding("OpenAI", "OPENAI_API_KEY environment variable not set"))?;
        Self::new(api_key)
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Declare the dimensionality of vectors produced by the configured model.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }

    /// Cap the number of inputs per request; larger batches are split.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    /// Replace the default request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = http_client("OpenAI", timeout)?;
        Ok(self)
    }

    /// Point the provider at an OpenAI-compatible API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.api_base.trim_end_matches('/'))
    }
}

/// An [`EmbeddingProvider`] backed by an Azure OpenAI embedding deployment.
pub struct AzureOpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    deployment: String,
    api_version: String,
    dimensions: usize,
    max_batch_size: usize,
}

impl AzureOpenAIEmbeddingProvider {
    /// Create a provider for `deployment` on the Azure resource at `endpoint`.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        let api_key = api_key.into();
        if endpoint.is_empty() || api_key.is_empty() {
            return Err(RagError::embedding(
                "AzureOpenAI",
                "endpoint and API key must not be empty",
            ));
        }

        Ok(Self {
            client: http_client("AzureOpenAI", DEFAULT_REQUEST_TIMEOUT)?,
            api_key,
            endpoint,
            deployment: deployment.into(),
            api_version: DEFAULT_AZURE_API_VERSION.into(),
            dimensions: DEFAULT_DIMENSIONS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        })
    }

    /// Set the REST API version (e.g. `2024-02-01`).
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Declare the dimensionality of vectors produced by the deployment.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }

    /// Cap the number of inputs per request; larger batches are split.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    /// Replace the default request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = http_client("AzureOpenAI", timeout)?;
        Ok(self)
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Whether an HTTP status indicates a transient failure.
fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// Restore input order (the API may return items out of order) and check the count.
fn into_ordered_vectors(
    provider: &str,
    mut data: Vec<EmbeddingData>,
    expected: usize,
) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(RagError::embedding(
            provider,
            format!("expected {expected} embeddings, received {}", data.len()),
        ));
    }
    if data.iter().all(|d| d.index.is_some()) {
        data.sort_by_key(|d| d.index);
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

/// Send one embeddings request and decode the response.
async fn send_embedding_request(
    provider: &str,
    request: reqwest::RequestBuilder,
    body: &EmbeddingRequest<'_>,
) -> Result<Vec<Vec<f32>>> {
    let response = request.json(body).send().await.map_err(|e| {
        error!(provider, error = %e, "request failed");
        let message = format!("request failed: {e}");
        if e.is_timeout() || e.is_connect() {
            RagError::embedding_transient(provider, message)
        } else {
            RagError::embedding(provider, message)
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail =
            serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);

        error!(provider, %status, "API error");
        let message = format!("API returned {status}: {detail}");
        return Err(if is_transient_status(status) {
            RagError::embedding_transient(provider, message)
        } else {
            RagError::embedding(provider, message)
        });
    }

    let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
        error!(provider, error = %e, "failed to parse response");
        RagError::embedding(provider, format!("failed to parse response: {e}"))
    })?;

    into_ordered_vectors(provider, embedding_response.data, body.input.len())
}

/// Split `texts` into requests of at most `max_batch_size` inputs and
/// concatenate the results in input order. Stops at the first failing request.
async fn embed_in_batches<'t, F, Fut>(
    texts: &[&'t str],
    max_batch_size: usize,
    mut send: F,
) -> Result<Vec<Vec<f32>>>
where
    F: FnMut(Vec<&'t str>) -> Fut,
    Fut: Future<Output = Result<Vec<Vec<f32>>>>,
{
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(max_batch_size.max(1)) {
        vectors.extend(send(batch.to_vec()).await?);
    }
    Ok(vectors)
}

// ── EmbeddingProvider implementations ──────────────────────────────

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "OpenAI", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding("OpenAI", "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "OpenAI", batch_size = texts.len(), model = %self.model, "embedding batch");

        embed_in_batches(texts, self.max_batch_size, |input| {
            let body = EmbeddingRequest { model: Some(&self.model), input };
            let request = self.client.post(self.endpoint()).bearer_auth(&self.api_key);
            async move { send_embedding_request("OpenAI", request, &body).await }
        })
        .await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAIEmbeddingProvider {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "AzureOpenAI", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding("AzureOpenAI", "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "AzureOpenAI",
            batch_size = texts.len(),
            deployment = %self.deployment,
            "embedding batch"
        );

        // The deployment selects the model, so none is sent in the body.
        embed_in_batches(texts, self.max_batch_size, |input| {
            let body = EmbeddingRequest { model: None, input };
            let request = self.client.post(self.url()).header("api-key", &self.api_key);
            async move { send_embedding_request("AzureOpenAI", request, &body).await }
        })
        .await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "AzureOpenAI"
    }
}
