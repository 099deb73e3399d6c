//! Document chunking.
//!
//! [`RecursiveChunker`] splits extracted document text hierarchically:
//! paragraphs, then lines, then sentences, then words, and finally a hard
//! character cutoff. The resulting pieces are merged greedily into chunks of
//! at most `chunk_size` characters, carrying up to `chunk_overlap` characters
//! of trailing context into the next chunk.
//!
//! Sizes are counted in characters, never bytes, so multi-byte text is never
//! split inside a code point.

use std::collections::VecDeque;

use crate::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, RagConfig, validate_chunking};
use crate::document::{Chunk, ChunkMetadata};
use crate::error::{RagError, Result};

/// Separators tried in order, from the coarsest boundary to the finest.
const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

/// A strategy for splitting document text into chunks.
///
/// Implementations produce [`Chunk`]s tagged with positional metadata.
/// Embeddings are attached later by the ingestion pipeline.
pub trait Chunker: Send + Sync {
    /// Split `text` belonging to `source_document` into chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyInput`] if `text` is empty or whitespace-only.
    fn chunk(&self, text: &str, source_document: &str) -> Result<Vec<Chunk>>;
}

/// A contiguous byte range of the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::{Chunker, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(1000, 200)?;
/// let chunks = chunker.chunk(&text, "report.pdf")?;
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, chunk_overlap: DEFAULT_CHUNK_OVERLAP }
    }
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Create a chunker from the chunking parameters of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Maximum number of characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of characters carried over between consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, text: &str, source_document: &str) -> Result<Vec<Chunk>> {
        let spans = split_text(text, self.chunk_size, self.chunk_overlap)?;
        let total_chunks = spans.len();

        Ok(spans
            .into_iter()
            .enumerate()
            .map(|(chunk_index, span)| Chunk {
                id: uuid::Uuid::new_v4().to_string(),
                text: text[span.start..span.end].to_string(),
                metadata: ChunkMetadata {
                    source_document: source_document.to_string(),
                    chunk_index,
                    total_chunks,
                    start_offset: span.start,
                    end_offset: span.end,
                },
            })
            .collect())
    }
}

/// Split `text` into chunk spans.
///
/// Every returned span is trimmed of surrounding whitespace, holds at most
/// `chunk_size` characters, and the spans jointly cover every non-whitespace
/// character of `text` in order.
///
/// # Errors
///
/// - [`RagError::EmptyInput`] if `text` is empty or whitespace-only.
/// - [`RagError::InvalidConfiguration`] if `chunk_size` is zero or
///   `chunk_overlap >= chunk_size`.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<TextSpan>> {
    validate_chunking(chunk_size, chunk_overlap)?;
    if text.trim().is_empty() {
        return Err(RagError::EmptyInput("no text to chunk".to_string()));
    }

    let mut pieces = Vec::new();
    split_recursive(text, 0, chunk_size, &SEPARATORS, &mut pieces);
    Ok(merge_pieces(text, &pieces, chunk_size, chunk_overlap))
}

/// A piece of the input no longer than `chunk_size` characters.
#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    chars: usize,
}

/// Break `text` (located at byte offset `base` of the full input) into pieces
/// that each fit in a chunk, trying coarser separators first.
fn split_recursive(
    text: &str,
    base: usize,
    chunk_size: usize,
    separators: &[&str],
    out: &mut Vec<Piece>,
) {
    let chars = text.chars().count();
    if chars <= chunk_size {
        if chars > 0 {
            out.push(Piece { start: base, end: base + text.len(), chars });
        }
        return;
    }

    let Some((separator, remaining)) = separators.split_first() else {
        split_by_chars(text, base, chunk_size, out);
        return;
    };

    let mut offset = 0;
    for segment in split_keeping_separator(text, separator) {
        split_recursive(segment, base + offset, chunk_size, remaining, out);
        offset += segment.len();
    }
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Hard cutoff every `chunk_size` characters.
fn split_by_chars(text: &str, base: usize, chunk_size: usize, out: &mut Vec<Piece>) {
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == chunk_size {
            out.push(Piece { start: base + start, end: base + idx, chars: count });
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if count > 0 {
        out.push(Piece { start: base + start, end: base + text.len(), chars: count });
    }
}

/// Greedily merge consecutive pieces into windows of at most `chunk_size`
/// characters, keeping up to `chunk_overlap` characters of the previous
/// window at the front of the next one.
fn merge_pieces(
    text: &str,
    pieces: &[Piece],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<TextSpan> {
    let mut spans: Vec<TextSpan> = Vec::new();
    let mut window: VecDeque<Piece> = VecDeque::new();
    let mut total = 0;

    for piece in pieces {
        if total + piece.chars > chunk_size && !window.is_empty() {
            emit_window(text, &window, &mut spans);
            while total > chunk_overlap || (total > 0 && total + piece.chars > chunk_size) {
                let Some(front) = window.pop_front() else { break };
                total -= front.chars;
            }
        }
        window.push_back(*piece);
        total += piece.chars;
    }

    if !window.is_empty() {
        emit_window(text, &window, &mut spans);
    }

    spans
}

/// Trim the window's span and record it unless it adds nothing new.
fn emit_window(text: &str, window: &VecDeque<Piece>, spans: &mut Vec<TextSpan>) {
    let (Some(first), Some(last)) = (window.front(), window.back()) else {
        return;
    };
    let Some(span) = trim_span(text, first.start, last.end) else {
        return;
    };
    // A window whose only new content was whitespace would repeat the overlap.
    if let Some(previous) = spans.last() {
        if span.start >= previous.start && span.end <= previous.end {
            return;
        }
    }
    spans.push(span);
}

fn trim_span(text: &str, start: usize, end: usize) -> Option<TextSpan> {
    let slice = &text[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    if leading == slice.len() {
        return None;
    }
    Some(TextSpan { start: start + leading, end: end - trailing })
}
