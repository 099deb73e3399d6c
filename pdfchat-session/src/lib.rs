//! # pdfchat-session
//!
//! Multi-turn conversation state for pdfchat.
//!
//! A conversation is an append-only list of [`ConversationTurn`]s keyed by a
//! caller-chosen id. Stores keep the full list; callers ask for a window with
//! [`ConversationStore::history`].
//!
//! ```rust,ignore
//! use pdfchat_session::{ConversationStore, InMemoryConversationStore};
//!
//! let store = InMemoryConversationStore::new();
//! store.append_exchange("default", "What is RAG?", "Retrieval-augmented generation.").await?;
//! let recent = store.history("default", 6).await?;
//! ```

pub mod error;
pub mod inmemory;
#[cfg(feature = "database")]
pub mod sqlite;
pub mod store;
pub mod turn;

pub use error::{Result, SessionError};
pub use inmemory::InMemoryConversationStore;
#[cfg(feature = "database")]
pub use sqlite::SqliteConversationStore;
pub use store::{ConversationStore, DEFAULT_HISTORY_TURNS};
pub use turn::{Conversation, ConversationTurn, Role, recent_turns};
