//! One-shot subcommands.

use std::path::Path;

use anyhow::{Context, anyhow};
use pdfchat_rag::{Citation, RetrievalResult};
use pdfchat_service::{ChatRequest, ChatResponse, ChatService};
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Output {
    pub json: bool,
}

impl Output {
    fn emit<T: Serialize>(self, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }
}

async fn read_upload(path: &Path, name: Option<String>) -> anyhow::Result<(Vec<u8>, String)> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = match name {
        Some(name) => name,
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("{} has no usable file name", path.display()))?,
    };
    Ok((bytes, filename))
}

pub(crate) async fn ingest(
    service: &ChatService,
    path: &Path,
    name: Option<String>,
    output: Output,
) -> anyhow::Result<()> {
    let (bytes, filename) = read_upload(path, name).await?;
    let report = service.ingest(&bytes, &filename).await?;
    output.emit(&report, |r| println!("Indexed {} ({} chunks)", r.filename, r.chunks_added))
}

pub(crate) async fn update(
    service: &ChatService,
    path: &Path,
    name: Option<String>,
    output: Output,
) -> anyhow::Result<()> {
    let (bytes, filename) = read_upload(path, name).await?;
    let report = service.update_document(&filename, &bytes).await?;
    output.emit(&report, |r| println!("Updated {} ({} chunks)", r.filename, r.chunks_added))
}

pub(crate) async fn delete(service: &ChatService, filename: &str, output: Output) -> anyhow::Result<()> {
    let report = service.delete_document(filename).await?;
    output.emit(&report, |r| println!("Deleted {} ({} chunks)", r.filename, r.chunks_deleted))
}

pub(crate) async fn list(service: &ChatService, output: Output) -> anyhow::Result<()> {
    let documents = service.list_documents().await?;
    output.emit(&documents, |docs| {
        if docs.is_empty() {
            println!("No documents indexed.");
        }
        for doc in docs {
            println!("{:>6}  {}", doc.chunk_count, doc.filename);
        }
    })
}

pub(crate) async fn info(service: &ChatService, filename: &str, output: Output) -> anyhow::Result<()> {
    let summary = service.document_info(filename).await?;
    output.emit(&summary, |s| println!("{}: {} chunks", s.filename, s.chunk_count))
}

pub(crate) async fn search(
    service: &ChatService,
    query: &str,
    k: usize,
    output: Output,
) -> anyhow::Result<()> {
    let hits = service.search(query, k).await?;
    output.emit(&hits, |hits| print_hits(hits))
}

pub(crate) async fn ask(
    service: &ChatService,
    message: String,
    conversation: String,
    use_context: bool,
    output: Output,
) -> anyhow::Result<()> {
    let mut request = ChatRequest::new(message).in_conversation(conversation);
    request.use_context = use_context;
    let reply = service.chat(request).await?;
    output.emit(&reply, print_reply)
}

pub(crate) async fn conversations(service: &ChatService, output: Output) -> anyhow::Result<()> {
    let ids = service.list_conversations().await?;
    output.emit(&ids, |ids| ids.iter().for_each(|id| println!("{id}")))
}

pub(crate) async fn history(
    service: &ChatService,
    conversation: &str,
    output: Output,
) -> anyhow::Result<()> {
    let turns = service.conversation_history(conversation).await?;
    output.emit(&turns, |turns| {
        for turn in turns {
            println!("{}: {}", turn.role, turn.content);
        }
    })
}

pub(crate) async fn clear(service: &ChatService, conversation: &str) -> anyhow::Result<()> {
    if service.clear_conversation(conversation).await? {
        println!("Cleared conversation {conversation}");
    } else {
        println!("No conversation named {conversation}");
    }
    Ok(())
}

pub(crate) async fn health(service: &ChatService, output: Output) -> anyhow::Result<()> {
    let report = service.health().await?;
    output.emit(&report, |r| {
        println!("status:      {}", r.status);
        println!("index:       {} chunks", r.indexed_chunks);
        println!("conversations: {}", r.conversations);
        println!("embeddings:  {}", r.embedding_provider);
        println!("completions: {}", r.completion_provider);
    })
}

pub(crate) fn print_reply(reply: &ChatResponse) {
    println!("{}", reply.response);
    print_citations(&reply.citations);
}

pub(crate) fn print_citations(citations: &[Citation]) {
    if citations.is_empty() {
        return;
    }
    println!("\nSources:");
    for (i, citation) in citations.iter().enumerate() {
        match citation.relevance_score {
            Some(score) => println!("  [{}] {} (relevance {:.2})", i + 1, citation.source, score),
            None => println!("  [{}] {}", i + 1, citation.source),
        }
    }
}

fn print_hits(hits: &[RetrievalResult]) {
    if hits.is_empty() {
        println!("No matching passages.");
    }
    for hit in hits {
        let distance = hit.distance.map(|d| format!("{d:.3}")).unwrap_or_else(|| "-".to_string());
        println!(
            "#{} {} chunk {} (distance {distance})\n    {}",
            hit.rank + 1,
            hit.source_document(),
            hit.chunk.metadata.chunk_index,
            hit.chunk.text.replace('\n', " ")
        );
    }
}
