//! Prompt assembly from retrieved passages and recent conversation turns.

use pdfchat_rag::RetrievalResult;
use pdfchat_rag::citation::UNKNOWN_SOURCE;
use pdfchat_session::{ConversationTurn, Role};
use serde::{Deserialize, Serialize};

const GROUNDED_PREAMBLE: &str = "You are a helpful AI assistant. Use the following context to answer the question. \nAlways cite your sources when using information from the context.";

const UNGROUNDED_PREAMBLE: &str =
    "You are a helpful AI assistant. Answer the question based on your knowledge.";

/// How a prompt was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Built around retrieved passages with a citation instruction.
    Grounded,
    /// Built from history and question only.
    Ungrounded,
}

/// The text handed to the completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub mode: PromptMode,
}

impl Prompt {
    pub fn is_grounded(&self) -> bool {
        self.mode == PromptMode::Grounded
    }
}

/// Builds prompts. Grounded when at least one passage was retrieved.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler;

impl ContextAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn assemble(
        &self,
        query: &str,
        retrieved: &[RetrievalResult],
        history: &[ConversationTurn],
    ) -> Prompt {
        let chat_history = format_history(history);

        if retrieved.is_empty() {
            let text = format!(
                "{UNGROUNDED_PREAMBLE}\n\nChat History:\n{chat_history}\n\nQuestion: {query}\n\nAnswer:"
            );
            return Prompt { text, mode: PromptMode::Ungrounded };
        }

        let context = format_context(retrieved);
        let text = format!(
            "{GROUNDED_PREAMBLE}\n\nContext:\n{context}\n\nChat History:\n{chat_history}\n\nQuestion: {query}\n\nAnswer:"
        );
        Prompt { text, mode: PromptMode::Grounded }
    }
}

/// `[Source i: name]` blocks, numbered from 1 in retrieval order.
fn format_context(retrieved: &[RetrievalResult]) -> String {
    retrieved
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let source = match result.source_document().trim() {
                "" => UNKNOWN_SOURCE,
                source => source,
            };
            format!("[Source {}: {}]\n{}\n", i + 1, source, result.chunk.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_history(history: &[ConversationTurn]) -> String {
    history
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                Role::User => "Human",
                Role::Assistant => "Assistant",
            };
            format!("{speaker}: {}", turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
