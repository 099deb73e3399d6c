//! Span constructors for the top-level pdfchat operations.
//!
//! Using shared constructors keeps span and field names identical across
//! the service and the CLI, so log queries can rely on them.

use tracing::{Span, info_span};

pub fn ingest_span(filename: &str) -> Span {
    info_span!("pdfchat.ingest", filename = %filename)
}

pub fn delete_span(filename: &str) -> Span {
    info_span!("pdfchat.delete", filename = %filename)
}

pub fn search_span(k: usize) -> Span {
    info_span!("pdfchat.search", k)
}

pub fn chat_span(conversation_id: &str, use_context: bool) -> Span {
    info_span!("pdfchat.chat", conversation_id = %conversation_id, use_context)
}
