//! The [`ChatService`] facade: ingestion, search and grounded chat.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use pdfchat_model::{CompletionProvider, DEFAULT_TEMPERATURE};
use pdfchat_rag::{
    Chunker, EmbeddingProvider, InMemoryVectorStore, IndexedRecord, MetadataFilter, RagConfig,
    RecursiveChunker, RetrievalResult, Retriever, VectorIndex, format_citations,
};
use pdfchat_session::{
    ConversationStore, ConversationTurn, DEFAULT_HISTORY_TURNS, InMemoryConversationStore,
    recent_turns,
};
use pdfchat_telemetry::{chat_span, delete_span, ingest_span, search_span};
use tracing::{Instrument, debug, info, warn};

use crate::context::ContextAssembler;
use crate::error::{Result, ServiceError};
use crate::extract::{ExtractorRegistry, TextExtractor};
use crate::generator::AnswerGenerator;
use crate::lock::KeyedLocks;
use crate::retry::RetryPolicy;
use crate::types::{
    ChatRequest, ChatResponse, DEFAULT_CONVERSATION_ID, DeleteReport, DocumentSummary,
    HealthReport, IngestReport,
};

const STATUS_SUCCESS: &str = "success";
const STATUS_DELETED: &str = "deleted";

/// The core-exposed interface of pdfchat.
///
/// One instance owns the index, the conversation store and the provider
/// handles; clone the `Arc` around it to share it between tasks. Operations
/// on the same document or the same conversation are serialized, everything
/// else runs concurrently.
pub struct ChatService {
    chunker: RecursiveChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    retriever: Retriever,
    conversations: Arc<dyn ConversationStore>,
    assembler: ContextAssembler,
    generator: AnswerGenerator,
    extractors: ExtractorRegistry,
    retry: RetryPolicy,
    top_k: usize,
    history_turns: usize,
    document_locks: KeyedLocks,
    conversation_locks: KeyedLocks,
}

impl ChatService {
    pub fn builder() -> ChatServiceBuilder {
        ChatServiceBuilder::default()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn supported_extensions(&self) -> Vec<String> {
        self.extractors.supported()
    }

    /// Extract, chunk, embed and index an uploaded file.
    ///
    /// An existing document with the same filename is replaced. Nothing in
    /// the index changes unless extraction and embedding both succeed.
    pub async fn ingest(&self, raw_bytes: &[u8], filename: &str) -> Result<IngestReport> {
        async {
            let extractor = self.validate_upload(raw_bytes, filename)?;
            let _guard = self.document_locks.lock(filename).await;
            let records = self.build_records(extractor.as_ref(), raw_bytes, filename).await?;
            self.replace_document(filename, records).await
        }
        .instrument(ingest_span(filename))
        .await
    }

    /// Replace the chunks of an already indexed document.
    pub async fn update_document(&self, filename: &str, raw_bytes: &[u8]) -> Result<IngestReport> {
        async {
            let extractor = self.validate_upload(raw_bytes, filename)?;
            let _guard = self.document_locks.lock(filename).await;
            if self.chunk_count(filename).await? == 0 {
                return Err(ServiceError::document_not_found(filename));
            }
            let records = self.build_records(extractor.as_ref(), raw_bytes, filename).await?;
            self.replace_document(filename, records).await
        }
        .instrument(ingest_span(filename))
        .await
    }

    /// Remove every chunk of `filename` from the index.
    pub async fn delete_document(&self, filename: &str) -> Result<DeleteReport> {
        async {
            let _guard = self.document_locks.lock(filename).await;
            let deleted = self
                .index
                .delete_where(&MetadataFilter::SourceDocument(filename.to_string()))
                .await?;
            if deleted == 0 {
                return Err(ServiceError::document_not_found(filename));
            }
            info!(chunks_deleted = deleted, "document deleted");
            Ok(DeleteReport {
                filename: filename.to_string(),
                chunks_deleted: deleted,
                status: STATUS_DELETED.to_string(),
            })
        }
        .instrument(delete_span(filename))
        .await
    }

    /// Indexed documents and their chunk counts, sorted by filename.
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in self.index.list_all().await? {
            *counts.entry(record.metadata.source_document).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(filename, chunk_count)| DocumentSummary { filename, chunk_count })
            .collect())
    }

    pub async fn document_info(&self, filename: &str) -> Result<DocumentSummary> {
        match self.chunk_count(filename).await? {
            0 => Err(ServiceError::document_not_found(filename)),
            chunk_count => Ok(DocumentSummary { filename: filename.to_string(), chunk_count }),
        }
    }

    /// The `k` indexed passages closest to `query`.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        if query.trim().is_empty() {
            return Err(ServiceError::EmptyInput("search query must not be empty".to_string()));
        }
        Ok(self.retriever.retrieve(query, k).instrument(search_span(k)).await?)
    }

    /// Answer one message, optionally grounded in indexed documents, and
    /// record the exchange in the conversation.
    ///
    /// The exchange is only recorded when an answer was produced.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let conversation_id = normalize_conversation_id(&request.conversation_id);
        let span = chat_span(&conversation_id, request.use_context);

        async {
            let _guard = self.conversation_locks.lock(&conversation_id).await;
            self.run_exchange(&conversation_id, &request).await.map_err(|e| {
                warn!(state = "FAILED", category = e.category(), error = %e, "chat failed");
                e
            })
        }
        .instrument(span)
        .await
    }

    pub async fn list_conversations(&self) -> Result<BTreeSet<String>> {
        Ok(self.conversations.list_ids().await?)
    }

    /// Forget a conversation. Returns `false` if it did not exist.
    pub async fn clear_conversation(&self, conversation_id: &str) -> Result<bool> {
        let conversation_id = normalize_conversation_id(conversation_id);
        let conversation_id = conversation_id.as_str();
        let _guard = self.conversation_locks.lock(conversation_id).await;
        let cleared = self.conversations.clear(conversation_id).await?;
        debug!(conversation_id, cleared, "clear conversation");
        Ok(cleared)
    }

    /// Every turn of a conversation, oldest first.
    pub async fn conversation_history(&self, conversation_id: &str) -> Result<Vec<ConversationTurn>> {
        let conversation_id = normalize_conversation_id(conversation_id);
        self.conversations
            .get(&conversation_id)
            .await?
            .map(|conversation| conversation.turns)
            .ok_or_else(|| ServiceError::conversation_not_found(&conversation_id))
    }

    pub async fn health(&self) -> Result<HealthReport> {
        let (index_reachable, indexed_chunks) = match self.index.count().await {
            Ok(count) => (true, count),
            Err(e) => {
                warn!(error = %e, "vector index health check failed");
                (false, 0)
            }
        };
        let conversations = self.conversations.list_ids().await?.len();

        Ok(HealthReport {
            status: (if index_reachable { "healthy" } else { "degraded" }).to_string(),
            index_reachable,
            indexed_chunks,
            conversations,
            embedding_provider: self.embedder.name().to_string(),
            completion_provider: self.generator.provider_name().to_string(),
        })
    }

    async fn run_exchange(&self, conversation_id: &str, request: &ChatRequest) -> Result<ChatResponse> {
        debug!(state = "RECEIVED", "chat request received");
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ServiceError::EmptyInput("chat message must not be empty".to_string()));
        }
        // The conversation is only created once the exchange is recorded.
        let earlier_turns = self
            .conversations
            .get(conversation_id)
            .await?
            .map(|conversation| conversation.turns)
            .unwrap_or_default();

        let retrieved = if request.use_context {
            debug!(state = "RETRIEVING", k = self.top_k, "retrieving context");
            self.retriever.retrieve(message, self.top_k).await?
        } else {
            Vec::new()
        };

        debug!(state = "ASSEMBLING", retrieved = retrieved.len(), "assembling prompt");
        let history = recent_turns(&earlier_turns, self.history_turns);
        let prompt = self.assembler.assemble(message, &retrieved, &history);

        debug!(state = "GENERATING", mode = ?prompt.mode, "generating answer");
        let answer = self.generator.generate(&prompt).await?;
        let citations = format_citations(&retrieved);

        debug!(state = "PERSISTING_HISTORY", "recording exchange");
        self.conversations.append_exchange(conversation_id, message, &answer).await?;

        debug!(state = "RESPONDED", citations = citations.len(), "chat answered");
        Ok(ChatResponse {
            response: answer,
            citations,
            conversation_id: conversation_id.to_string(),
        })
    }

    fn validate_upload(&self, raw_bytes: &[u8], filename: &str) -> Result<Arc<dyn TextExtractor>> {
        if filename.trim().is_empty() {
            return Err(ServiceError::EmptyInput("filename must not be empty".to_string()));
        }
        let extractor = self.extractors.for_filename(filename)?;
        if raw_bytes.is_empty() {
            return Err(ServiceError::EmptyFile(filename.to_string()));
        }
        Ok(extractor)
    }

    async fn build_records(
        &self,
        extractor: &dyn TextExtractor,
        raw_bytes: &[u8],
        filename: &str,
    ) -> Result<Vec<IndexedRecord>> {
        let text = extractor.extract(raw_bytes, filename).await?;
        if text.trim().is_empty() {
            return Err(ServiceError::Extraction {
                filename: filename.to_string(),
                message: "no text could be extracted".to_string(),
            });
        }

        let chunks = self.chunker.chunk(&text, filename)?;
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings =
            self.retry.run("embed_batch", || self.embedder.embed_batch(&texts)).await?;
        if embeddings.len() != chunks.len() {
            return Err(ServiceError::EmbeddingService {
                provider: self.embedder.name().to_string(),
                message: format!(
                    "expected {} embeddings, received {}",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }

        debug!(text_chars = text.chars().count(), chunks = chunks.len(), "document embedded");
        Ok(chunks.into_iter().zip(embeddings).map(|(c, e)| IndexedRecord::from_chunk(c, e)).collect())
    }

    async fn replace_document(&self, filename: &str, records: Vec<IndexedRecord>) -> Result<IngestReport> {
        let replaced = self
            .index
            .replace_where(&MetadataFilter::SourceDocument(filename.to_string()), &records)
            .await?;

        info!(chunks_added = records.len(), chunks_replaced = replaced, "document indexed");
        Ok(IngestReport {
            filename: filename.to_string(),
            chunks_added: records.len(),
            status: STATUS_SUCCESS.to_string(),
        })
    }

    async fn chunk_count(&self, filename: &str) -> Result<usize> {
        let records = self.index.list_all().await?;
        Ok(records.iter().filter(|r| r.metadata.source_document == filename).count())
    }
}

/// Trimmed conversation id; a blank id names the default conversation.
fn normalize_conversation_id(conversation_id: &str) -> String {
    match conversation_id.trim() {
        "" => DEFAULT_CONVERSATION_ID.to_string(),
        id => id.to_string(),
    }
}

/// Assembles a [`ChatService`] from injected collaborators.
///
/// An embedding provider and a completion provider are required; the index
/// and conversation store default to in-memory implementations.
pub struct ChatServiceBuilder {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    completion: Option<Arc<dyn CompletionProvider>>,
    index: Option<Arc<dyn VectorIndex>>,
    conversations: Option<Arc<dyn ConversationStore>>,
    extractors: ExtractorRegistry,
    rag: RagConfig,
    temperature: f32,
    history_turns: usize,
    retry: RetryPolicy,
}

impl Default for ChatServiceBuilder {
    fn default() -> Self {
        Self {
            embedder: None,
            completion: None,
            index: None,
            conversations: None,
            extractors: ExtractorRegistry::default(),
            rag: RagConfig::default(),
            temperature: DEFAULT_TEMPERATURE,
            history_turns: DEFAULT_HISTORY_TURNS,
            retry: RetryPolicy::default(),
        }
    }
}

impl ChatServiceBuilder {
    pub fn embedding_provider(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn completion_provider(mut self, completion: Arc<dyn CompletionProvider>) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn conversation_store(mut self, conversations: Arc<dyn ConversationStore>) -> Self {
        self.conversations = Some(conversations);
        self
    }

    /// Replace the whole extractor registry.
    pub fn extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = extractors;
        self
    }

    /// Register or override the extractor for one extension.
    pub fn extractor(mut self, extension: &str, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractors.register(extension, extractor);
        self
    }

    pub fn rag_config(mut self, rag: RagConfig) -> Self {
        self.rag = rag;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn history_turns(mut self, history_turns: usize) -> Self {
        self.history_turns = history_turns;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> Result<ChatService> {
        self.rag.validate()?;
        let embedder = self.embedder.ok_or_else(|| {
            ServiceError::InvalidConfiguration("an embedding provider is required".to_string())
        })?;
        let completion = self.completion.ok_or_else(|| {
            ServiceError::InvalidConfiguration("a completion provider is required".to_string())
        })?;
        let index = self.index.unwrap_or_else(|| Arc::new(InMemoryVectorStore::new()));
        let conversations =
            self.conversations.unwrap_or_else(|| Arc::new(InMemoryConversationStore::new()));

        Ok(ChatService {
            chunker: RecursiveChunker::from_config(&self.rag)?,
            retriever: Retriever::new(embedder.clone(), index.clone()),
            embedder,
            index,
            conversations,
            assembler: ContextAssembler::new(),
            generator: AnswerGenerator::new(completion).with_temperature(self.temperature),
            extractors: self.extractors,
            retry: self.retry,
            top_k: self.rag.top_k,
            history_turns: self.history_turns,
            document_locks: KeyedLocks::new(),
            conversation_locks: KeyedLocks::new(),
        })
    }
}
