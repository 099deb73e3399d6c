//! Behaviour shared by every conversation store backend.

use std::sync::Arc;

use pdfchat_session::{
    ConversationStore, ConversationTurn, DEFAULT_HISTORY_TURNS, InMemoryConversationStore, Role,
};

async fn history_window_is_the_chronological_tail(store: &dyn ConversationStore) {
    for i in 0..5 {
        store.append_exchange("c1", &format!("q{i}"), &format!("a{i}")).await.unwrap();
    }
    assert_eq!(store.turn_count("c1").await.unwrap(), 10);

    let recent = store.history("c1", DEFAULT_HISTORY_TURNS).await.unwrap();
    let expected = vec![
        ConversationTurn::user("q2"),
        ConversationTurn::assistant("a2"),
        ConversationTurn::user("q3"),
        ConversationTurn::assistant("a3"),
        ConversationTurn::user("q4"),
        ConversationTurn::assistant("a4"),
    ];
    assert_eq!(recent, expected);

    // Storage itself is never truncated.
    let full = store.get("c1").await.unwrap().unwrap();
    assert_eq!(full.turns.len(), 10);
    assert_eq!(full.turns[0], ConversationTurn::user("q0"));
}

async fn unknown_conversations_are_empty(store: &dyn ConversationStore) {
    assert!(store.history("missing", 6).await.unwrap().is_empty());
    assert!(store.get("missing").await.unwrap().is_none());
    assert_eq!(store.turn_count("missing").await.unwrap(), 0);
    assert!(!store.clear("missing").await.unwrap());
}

async fn conversations_are_created_lazily_and_cleared(store: &dyn ConversationStore) {
    let created = store.get_or_create("lazy").await.unwrap();
    assert_eq!(created.id, "lazy");
    assert!(created.turns.is_empty());

    store.append_turn("other", Role::User, "hello").await.unwrap();

    let ids = store.list_ids().await.unwrap();
    assert!(ids.contains("lazy"));
    assert!(ids.contains("other"));

    assert!(store.clear("other").await.unwrap());
    assert!(!store.list_ids().await.unwrap().contains("other"));
    assert!(store.history("other", 6).await.unwrap().is_empty());
}

#[tokio::test]
async fn inmemory_history_window() {
    history_window_is_the_chronological_tail(&InMemoryConversationStore::new()).await;
}

#[tokio::test]
async fn inmemory_unknown_conversations() {
    unknown_conversations_are_empty(&InMemoryConversationStore::new()).await;
}

#[tokio::test]
async fn inmemory_lazy_creation_and_clear() {
    conversations_are_created_lazily_and_cleared(&InMemoryConversationStore::new()).await;
}

#[tokio::test]
async fn concurrent_exchanges_never_interleave() {
    let store = Arc::new(InMemoryConversationStore::new());
    let mut handles = Vec::new();
    for i in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.append_exchange("shared", &format!("q{i}"), &format!("a{i}")).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let turns = store.get("shared").await.unwrap().unwrap().turns;
    assert_eq!(turns.len(), 40);
    for pair in turns.chunks(2) {
        assert_eq!(pair[0].role, Role::User);
        assert_eq!(pair[1].role, Role::Assistant);
        assert_eq!(pair[0].content[1..], pair[1].content[1..]);
    }
}

#[cfg(feature = "database")]
mod sqlite {
    use super::*;
    use pdfchat_session::SqliteConversationStore;

    #[tokio::test]
    async fn sqlite_history_window() {
        let store = SqliteConversationStore::in_memory().await.unwrap();
        history_window_is_the_chronological_tail(&store).await;
    }

    #[tokio::test]
    async fn sqlite_unknown_conversations() {
        let store = SqliteConversationStore::in_memory().await.unwrap();
        unknown_conversations_are_empty(&store).await;
    }

    #[tokio::test]
    async fn sqlite_lazy_creation_and_clear() {
        let store = SqliteConversationStore::in_memory().await.unwrap();
        conversations_are_created_lazily_and_cleared(&store).await;
    }
}
