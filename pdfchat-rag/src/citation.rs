//! Citation formatting for retrieved passages.

use std::collections::HashSet;

use crate::document::{Citation, RetrievalResult};

/// Maximum number of characters of passage text shown in a citation.
pub const PREVIEW_CHARS: usize = 200;

/// Marker appended to every citation preview.
pub const ELLIPSIS: &str = "...";

/// Source name used when a record carries no source document.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Derive a deduplicated citation list from retrieval results.
///
/// Results are visited in rank order and only the first (highest-ranked)
/// result of each source produces a citation, so the output follows
/// first-seen order rather than alphabetical or score order.
pub fn format_citations(retrieved: &[RetrievalResult]) -> Vec<Citation> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ordered: Vec<&RetrievalResult> = retrieved.iter().collect();
    ordered.sort_by_key(|r| r.rank);

    ordered
        .into_iter()
        .filter_map(|result| {
            let source = source_of(result);
            if !seen.insert(source) {
                return None;
            }
            Some(Citation {
                source: source.to_string(),
                content: preview(&result.chunk.text),
                relevance_score: result.distance.map(|d| 1.0 - d),
            })
        })
        .collect()
}

fn source_of(result: &RetrievalResult) -> &str {
    let source = result.source_document().trim();
    if source.is_empty() { UNKNOWN_SOURCE } else { source }
}

/// First [`PREVIEW_CHARS`] characters of `text` followed by [`ELLIPSIS`].
fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    preview.push_str(ELLIPSIS);
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ChunkMetadata, RetrievedChunk};

    fn result(source: &str, text: &str, distance: Option<f32>, rank: usize) -> RetrievalResult {
        RetrievalResult {
            chunk: RetrievedChunk {
                id: format!("{source}-{rank}"),
                text: text.to_string(),
                metadata: ChunkMetadata {
                    source_document: source.to_string(),
                    chunk_index: rank,
                    total_chunks: 4,
                    start_offset: 0,
                    end_offset: text.len(),
                },
            },
            distance,
            rank,
        }
    }

    #[test]
    fn one_citation_per_source_in_first_seen_order() {
        let results = vec![
            result("A", "first a", Some(0.1), 0),
            result("A", "second a", Some(0.2), 1),
            result("B", "first b", Some(0.3), 2),
            result("A", "third a", Some(0.4), 3),
        ];
        let citations = format_citations(&results);
        let sources: Vec<&str> = citations.iter().map(|c| c.source.as_str()).collect();
        assert_eq!(sources, vec!["A", "B"]);
        assert_eq!(citations[0].content, "first a...");
    }

    #[test]
    fn relevance_is_one_minus_distance() {
        let citations = format_citations(&[result("A", "x", Some(0.2), 0)]);
        let score = citations[0].relevance_score.unwrap();
        assert!((score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn missing_distance_gives_missing_relevance() {
        let citations = format_citations(&[result("A", "x", None, 0)]);
        assert!(citations[0].relevance_score.is_none());
    }

    #[test]
    fn zero_distance_is_full_relevance() {
        let citations = format_citations(&[result("A", "x", Some(0.0), 0)]);
        assert_eq!(citations[0].relevance_score, Some(1.0));
    }

    #[test]
    fn preview_is_truncated_to_200_chars() {
        let long = "ü".repeat(500);
        let citations = format_citations(&[result("A", &long, Some(0.5), 0)]);
        assert_eq!(citations[0].content.chars().count(), PREVIEW_CHARS + ELLIPSIS.len());
        assert!(citations[0].content.ends_with("..."));
    }

    #[test]
    fn blank_source_is_reported_as_unknown() {
        let citations = format_citations(&[result("  ", "x", None, 0)]);
        assert_eq!(citations[0].source, UNKNOWN_SOURCE);
    }

    #[test]
    fn empty_results_give_no_citations() {
        assert!(format_citations(&[]).is_empty());
    }
}
