//! Process-local [`ConversationStore`].
//!
//! Conversations live in a `HashMap` behind a `tokio::sync::RwLock`, each with
//! its own turn list behind a `Mutex`. Nothing survives a restart; enable the
//! `database` feature for `SqliteConversationStore`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::Result;
use crate::store::ConversationStore;
use crate::turn::{Conversation, ConversationTurn, Role, recent_turns};

type Turns = Arc<Mutex<Vec<ConversationTurn>>>;

/// Process-local conversation store.
///
/// The outer map lock is only held long enough to find or insert a
/// conversation; appends take that conversation's own lock, so writers to
/// different conversations never wait on each other.
#[derive(Debug, Default, Clone)]
pub struct InMemoryConversationStore {
    conversations: Arc<RwLock<HashMap<String, Turns>>>,
}

impl InMemoryConversationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn lookup(&self, id: &str) -> Option<Turns> {
        self.conversations.read().await.get(id).cloned()
    }

    async fn ensure(&self, id: &str) -> Turns {
        if let Some(turns) = self.lookup(id).await {
            return turns;
        }
        let mut conversations = self.conversations.write().await;
        conversations
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(conversation_id = %id, "created conversation");
                Arc::new(Mutex::new(Vec::new()))
            })
            .clone()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get_or_create(&self, id: &str) -> Result<Conversation> {
        let turns = self.ensure(id).await;
        let turns = turns.lock().await.clone();
        Ok(Conversation { id: id.to_string(), turns })
    }

    async fn get(&self, id: &str) -> Result<Option<Conversation>> {
        let Some(turns) = self.lookup(id).await else {
            return Ok(None);
        };
        let turns = turns.lock().await.clone();
        Ok(Some(Conversation { id: id.to_string(), turns }))
    }

    async fn append_turn(&self, id: &str, role: Role, content: &str) -> Result<()> {
        let turns = self.ensure(id).await;
        turns.lock().await.push(ConversationTurn::new(role, content));
        Ok(())
    }

    async fn append_exchange(&self, id: &str, user: &str, assistant: &str) -> Result<()> {
        let turns = self.ensure(id).await;
        let mut turns = turns.lock().await;
        turns.push(ConversationTurn::user(user));
        turns.push(ConversationTurn::assistant(assistant));
        debug!(conversation_id = %id, turn_count = turns.len(), "appended exchange");
        Ok(())
    }

    async fn history(&self, id: &str, max_turns: usize) -> Result<Vec<ConversationTurn>> {
        let Some(turns) = self.lookup(id).await else {
            return Ok(Vec::new());
        };
        let turns = turns.lock().await;
        Ok(recent_turns(&turns, max_turns))
    }

    async fn clear(&self, id: &str) -> Result<bool> {
        let removed = self.conversations.write().await.remove(id).is_some();
        if removed {
            debug!(conversation_id = %id, "cleared conversation");
        }
        Ok(removed)
    }

    async fn list_ids(&self) -> Result<BTreeSet<String>> {
        Ok(self.conversations.read().await.keys().cloned().collect())
    }

    async fn turn_count(&self, id: &str) -> Result<usize> {
        match self.lookup(id).await {
            Some(turns) => Ok(turns.lock().await.len()),
            None => Ok(0),
        }
    }
}
