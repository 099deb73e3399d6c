//! SQLite-backed conversation store, enabled by the `database` feature.
//!
//! Turns are stored one row each with an autoincrement key, which gives the
//! chronological order without relying on timestamps.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::error::{Result, SessionError};
use crate::store::ConversationStore;
use crate::turn::{Conversation, ConversationTurn, Role};

const BACKEND: &str = "sqlite";

/// A [`ConversationStore`] persisted in a SQLite database file.
pub struct SqliteConversationStore {
    pool: SqlitePool,
}

impl SqliteConversationStore {
    /// Open (creating if missing) the database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| unavailable(e.to_string()))?;
        }

        let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        info!(path = %path.display(), "opened sqlite conversation store");
        Ok(store)
    }

    /// Open a private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS conversations (\
                id TEXT PRIMARY KEY, \
                created_at TEXT NOT NULL\
            )",
            "CREATE TABLE IF NOT EXISTS conversation_turns (\
                turn_id INTEGER PRIMARY KEY AUTOINCREMENT, \
                conversation_id TEXT NOT NULL, \
                role TEXT NOT NULL, \
                content TEXT NOT NULL, \
                created_at TEXT NOT NULL\
            )",
            "CREATE INDEX IF NOT EXISTS conversation_turns_by_conversation \
                ON conversation_turns (conversation_id, turn_id)",
        ];
        for sql in statements {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| unavailable(e.to_string()))?;
        }
        Ok(())
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM conversations WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.is_some())
    }

    async fn insert_turns(&self, id: &str, turns: &[(Role, &str)]) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query("INSERT OR IGNORE INTO conversations (id, created_at) VALUES (?1, ?2)")
            .bind(id)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        for (role, content) in turns {
            sqlx::query(
                "INSERT INTO conversation_turns (conversation_id, role, content, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(id)
            .bind(role.as_str())
            .bind(*content)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)
    }

    async fn all_turns(&self, id: &str) -> Result<Vec<ConversationTurn>> {
        let rows = sqlx::query(
            "SELECT role, content FROM conversation_turns \
             WHERE conversation_id = ?1 ORDER BY turn_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.iter().map(turn_from_row).collect()
    }
}

fn turn_from_row(row: &SqliteRow) -> Result<ConversationTurn> {
    let role: String = row.try_get("role").map_err(storage)?;
    let role = role.parse::<Role>().map_err(|message| SessionError::Storage {
        backend: BACKEND.to_string(),
        message,
    })?;
    Ok(ConversationTurn { role, content: row.try_get("content").map_err(storage)? })
}

fn unavailable(message: String) -> SessionError {
    SessionError::Unavailable { backend: BACKEND.to_string(), message }
}

fn storage(e: sqlx::Error) -> SessionError {
    SessionError::Storage { backend: BACKEND.to_string(), message: e.to_string() }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn get_or_create(&self, id: &str) -> Result<Conversation> {
        self.insert_turns(id, &[]).await?;
        Ok(Conversation { id: id.to_string(), turns: self.all_turns(id).await? })
    }

    async fn get(&self, id: &str) -> Result<Option<Conversation>> {
        if !self.exists(id).await? {
            return Ok(None);
        }
        Ok(Some(Conversation { id: id.to_string(), turns: self.all_turns(id).await? }))
    }

    async fn append_turn(&self, id: &str, role: Role, content: &str) -> Result<()> {
        self.insert_turns(id, &[(role, content)]).await
    }

    async fn append_exchange(&self, id: &str, user: &str, assistant: &str) -> Result<()> {
        self.insert_turns(id, &[(Role::User, user), (Role::Assistant, assistant)]).await?;
        debug!(conversation_id = %id, "appended exchange");
        Ok(())
    }

    async fn history(&self, id: &str, max_turns: usize) -> Result<Vec<ConversationTurn>> {
        let rows = sqlx::query(
            "SELECT role, content FROM conversation_turns \
             WHERE conversation_id = ?1 ORDER BY turn_id DESC LIMIT ?2",
        )
        .bind(id)
        .bind(max_turns as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut turns = rows.iter().map(turn_from_row).collect::<Result<Vec<_>>>()?;
        turns.reverse();
        Ok(turns)
    }

    async fn clear(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        sqlx::query("DELETE FROM conversation_turns WHERE conversation_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        let removed = sqlx::query("DELETE FROM conversations WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?
            .rows_affected();
        tx.commit().await.map_err(storage)?;
        Ok(removed > 0)
    }

    async fn list_ids(&self) -> Result<BTreeSet<String>> {
        let ids: Vec<(String,)> = sqlx::query_as("SELECT id FROM conversations")
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn turn_count(&self, id: &str) -> Result<usize> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM conversation_turns WHERE conversation_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(storage)?;
        Ok(count as usize)
    }
}
