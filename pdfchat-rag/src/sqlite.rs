//! Durable SQLite vector index.
//!
//! Provides [`SqliteVectorStore`] which implements [`VectorIndex`] using
//! [sqlx](https://docs.rs/sqlx). Each collection is a table holding the chunk
//! text, positional metadata and the embedding as a little-endian `f32` BLOB.
//! Similarity search is a brute-force cosine scan, which is adequate for the
//! document counts a single chatbot instance holds.
//!
//! # Example
//!
//! ```rust,ignore
//! use pdfchat_rag::sqlite::SqliteVectorStore;
//!
//! let store = SqliteVectorStore::open("./pdfchat_index.db", "documents").await?;
//! store.upsert(&records).await?;
//! let results = store.query(&query_embedding, 5).await?;
//! ```

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::document::{ChunkMetadata, IndexedRecord, MetadataFilter, RetrievalResult};
use crate::error::{RagError, Result};
use crate::inmemory::{check_dimensions, check_query_dimensions};
use crate::vectorstore::{VectorIndex, cosine_distance, rank_by_distance};

const BACKEND: &str = "sqlite";

/// A [`VectorIndex`] persisted in a SQLite database file.
pub struct SqliteVectorStore {
    pool: SqlitePool,
    table: String,
}

impl SqliteVectorStore {
    /// Open (creating if missing) the database at `path` and ensure the
    /// collection table exists.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexUnavailable`] if the database cannot be opened
    /// or the schema cannot be created.
    pub async fn open(path: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Self::unavailable(e.to_string()))?;
        }

        let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Self::unavailable(e.to_string()))?;

        let store = Self::from_pool(pool, collection)?;
        store.migrate().await?;
        info!(path = %path.display(), table = %store.table, "opened sqlite vector index");
        Ok(store)
    }

    /// Open a private in-memory database. Contents vanish with the store.
    pub async fn in_memory(collection: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        // A second connection would see a different in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| Self::unavailable(e.to_string()))?;

        let store = Self::from_pool(pool, collection)?;
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool. Call [`open`](Self::open) instead unless the
    /// schema has already been created.
    pub fn from_pool(pool: SqlitePool, collection: &str) -> Result<Self> {
        Ok(Self { pool, table: Self::sanitize_table_name(collection)? })
    }

    fn unavailable(message: String) -> RagError {
        RagError::IndexUnavailable { backend: BACKEND.to_string(), message }
    }

    fn map_err(e: sqlx::Error) -> RagError {
        RagError::VectorStoreError { backend: BACKEND.to_string(), message: e.to_string() }
    }

    /// Sanitize a collection name for use as a table name.
    /// Only allows alphanumeric characters and underscores.
    fn sanitize_table_name(name: &str) -> Result<String> {
        let sanitized: String =
            name.chars().map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' }).collect();
        if sanitized.is_empty() {
            return Err(RagError::InvalidConfiguration(
                "collection name is empty after sanitization".to_string(),
            ));
        }
        Ok(format!("rag_{sanitized}"))
    }

    async fn migrate(&self) -> Result<()> {
        let table = &self.table;
        let create_sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
                id TEXT PRIMARY KEY, \
                source_document TEXT NOT NULL, \
                chunk_index INTEGER NOT NULL, \
                total_chunks INTEGER NOT NULL, \
                start_offset INTEGER NOT NULL DEFAULT 0, \
                end_offset INTEGER NOT NULL DEFAULT 0, \
                text TEXT NOT NULL, \
                embedding BLOB NOT NULL, \
                dimensions INTEGER NOT NULL, \
                updated_at TEXT NOT NULL\
            )"
        );
        let index_sql =
            format!("CREATE INDEX IF NOT EXISTS {table}_source ON {table} (source_document)");

        sqlx::query(&create_sql)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::unavailable(e.to_string()))?;
        sqlx::query(&index_sql)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::unavailable(e.to_string()))?;
        Ok(())
    }

    async fn stored_dimensions(&self) -> Result<Option<usize>> {
        let sql = format!("SELECT dimensions FROM {} LIMIT 1", self.table);
        let row: Option<(i64,)> =
            sqlx::query_as(&sql).fetch_optional(&self.pool).await.map_err(Self::map_err)?;
        Ok(row.map(|(d,)| d as usize))
    }

    fn record_from_row(row: &SqliteRow) -> Result<IndexedRecord> {
        let get_usize = |column: &str| -> Result<usize> {
            row.try_get::<i64, _>(column).map(|v| v as usize).map_err(Self::map_err)
        };
        let bytes: Vec<u8> = row.try_get("embedding").map_err(Self::map_err)?;

        Ok(IndexedRecord {
            id: row.try_get("id").map_err(Self::map_err)?,
            embedding: bytes_to_embedding(&bytes),
            text: row.try_get("text").map_err(Self::map_err)?,
            metadata: ChunkMetadata {
                source_document: row.try_get("source_document").map_err(Self::map_err)?,
                chunk_index: get_usize("chunk_index")?,
                total_chunks: get_usize("total_chunks")?,
                start_offset: get_usize("start_offset")?,
                end_offset: get_usize("end_offset")?,
            },
        })
    }

    /// Insert or overwrite `records` inside an open transaction.
    async fn write_records(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        records: &[IndexedRecord],
    ) -> Result<()> {
        let upsert_sql = format!(
            "INSERT INTO {} (id, source_document, chunk_index, total_chunks, start_offset, \
                             end_offset, text, embedding, dimensions, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
             ON CONFLICT (id) DO UPDATE SET \
                source_document = excluded.source_document, \
                chunk_index = excluded.chunk_index, \
                total_chunks = excluded.total_chunks, \
                start_offset = excluded.start_offset, \
                end_offset = excluded.end_offset, \
                text = excluded.text, \
                embedding = excluded.embedding, \
                dimensions = excluded.dimensions, \
                updated_at = excluded.updated_at",
            self.table
        );
        let now = chrono::Utc::now().to_rfc3339();

        for record in records {
            sqlx::query(&upsert_sql)
                .bind(&record.id)
                .bind(&record.metadata.source_document)
                .bind(record.metadata.chunk_index as i64)
                .bind(record.metadata.total_chunks as i64)
                .bind(record.metadata.start_offset as i64)
                .bind(record.metadata.end_offset as i64)
                .bind(&record.text)
                .bind(embedding_to_bytes(&record.embedding))
                .bind(record.embedding.len() as i64)
                .bind(&now)
                .execute(&mut **tx)
                .await
                .map_err(Self::map_err)?;
        }
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<IndexedRecord>> {
        let sql = format!(
            "SELECT id, source_document, chunk_index, total_chunks, start_offset, end_offset, \
                    text, embedding \
             FROM {} ORDER BY source_document, chunk_index",
            self.table
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await.map_err(Self::map_err)?;
        rows.iter().map(Self::record_from_row).collect()
    }
}

/// Serialize an embedding to bytes for BLOB storage.
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize an embedding from BLOB bytes.
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[async_trait]
impl VectorIndex for SqliteVectorStore {
    async fn upsert(&self, records: &[IndexedRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        check_dimensions(self.stored_dimensions().await?, records)?;

        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;
        self.write_records(&mut tx, records).await?;
        tx.commit().await.map_err(Self::map_err)?;

        debug!(table = %self.table, count = records.len(), "upserted records to sqlite");
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
        check_query_dimensions(self.stored_dimensions().await?, embedding)?;
        let scored: Vec<(f32, IndexedRecord)> = self
            .fetch_all()
            .await?
            .into_iter()
            .map(|record| (cosine_distance(&record.embedding, embedding), record))
            .collect();
        Ok(rank_by_distance(scored, k))
    }

    async fn delete_where(&self, filter: &MetadataFilter) -> Result<usize> {
        let result = match filter {
            MetadataFilter::SourceDocument(name) => {
                let sql = format!("DELETE FROM {} WHERE source_document = ?1", self.table);
                sqlx::query(&sql).bind(name).execute(&self.pool).await.map_err(Self::map_err)?
            }
        };
        let deleted = result.rows_affected() as usize;
        debug!(table = %self.table, deleted, "deleted records from sqlite");
        Ok(deleted)
    }

    async fn replace_where(
        &self,
        filter: &MetadataFilter,
        records: &[IndexedRecord],
    ) -> Result<usize> {
        let MetadataFilter::SourceDocument(name) = filter;
        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;

        let sql = format!(
            "SELECT dimensions FROM {} WHERE source_document != ?1 LIMIT 1",
            self.table
        );
        let remaining: Option<(i64,)> =
            sqlx::query_as(&sql).bind(name).fetch_optional(&mut *tx).await.map_err(Self::map_err)?;
        check_dimensions(remaining.map(|(d,)| d as usize), records)?;

        let sql = format!("DELETE FROM {} WHERE source_document = ?1", self.table);
        let deleted = sqlx::query(&sql)
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?
            .rows_affected() as usize;
        self.write_records(&mut tx, records).await?;
        tx.commit().await.map_err(Self::map_err)?;

        debug!(table = %self.table, deleted, inserted = records.len(), "replaced records in sqlite");
        Ok(deleted)
    }

    async fn list_all(&self) -> Result<Vec<IndexedRecord>> {
        self.fetch_all().await
    }

    async fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let (count,): (i64,) =
            sqlx::query_as(&sql).fetch_one(&self.pool).await.map_err(Self::map_err)?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_bytes_roundtrip() {
        let emb = vec![0.1, 0.2, -0.3, 0.4];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&emb)), emb);
    }

    #[test]
    fn table_names_are_sanitized() {
        assert_eq!(
            SqliteVectorStore::sanitize_table_name("pdf-chat docs").unwrap(),
            "rag_pdf_chat_docs"
        );
        assert!(SqliteVectorStore::sanitize_table_name("").is_err());
    }

    #[tokio::test]
    async fn unopenable_path_is_reported_as_unavailable() {
        let err = SqliteVectorStore::open("/proc/definitely/not/here/index.db", "docs")
            .await
            .err()
            .expect("opening under /proc must fail");
        assert!(matches!(err, RagError::IndexUnavailable { .. }));
    }
}
