//! The [`ConversationStore`] trait.
//!
//! A store maps a conversation id to its ordered list of turns. The chat
//! service reads a window of recent turns before answering and records the
//! user message and the answer together once the answer exists.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::turn::{Conversation, ConversationTurn, Role};

/// Number of turns returned by [`ConversationStore::recent`].
pub const DEFAULT_HISTORY_TURNS: usize = 6;

/// Storage for per-conversation turn lists.
///
/// Conversations are created lazily on first use and keep every turn;
/// truncation only happens when history is read.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Return the conversation, creating an empty one if it does not exist.
    async fn get_or_create(&self, id: &str) -> Result<Conversation>;

    /// Return the conversation if it exists.
    async fn get(&self, id: &str) -> Result<Option<Conversation>>;

    /// Append a single turn, creating the conversation if needed.
    async fn append_turn(&self, id: &str, role: Role, content: &str) -> Result<()>;

    /// Append a user turn followed by an assistant turn as one unit, creating
    /// the conversation if needed. No other writer can interleave between the
    /// two.
    async fn append_exchange(&self, id: &str, user: &str, assistant: &str) -> Result<()>;

    /// The most recent `max_turns` turns in chronological order. Unknown ids
    /// yield an empty list.
    async fn history(&self, id: &str, max_turns: usize) -> Result<Vec<ConversationTurn>>;

    /// Remove the conversation. Returns `false` if it did not exist.
    async fn clear(&self, id: &str) -> Result<bool>;

    /// Identifiers of every live conversation.
    async fn list_ids(&self) -> Result<BTreeSet<String>>;

    /// Number of stored turns. Unknown ids count as zero.
    async fn turn_count(&self, id: &str) -> Result<usize> {
        Ok(self.get(id).await?.map(|c| c.turns.len()).unwrap_or(0))
    }

    /// [`history`](Self::history) with [`DEFAULT_HISTORY_TURNS`].
    async fn recent(&self, id: &str) -> Result<Vec<ConversationTurn>> {
        self.history(id, DEFAULT_HISTORY_TURNS).await
    }
}
