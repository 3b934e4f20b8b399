//! SQLite-backed [`Store`] implementation.
//!
//! Documents live in one table with their metadata as a JSON column;
//! chunks live in a child table with the embedding as a little-endian f32
//! BLOB. Similarity search loads the category's vectors and scores them
//! in process with [`cosine_similarity`] — exact nearest-neighbor, which
//! is plenty for a single course's corpus.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::models::{Candidate, Category, DocMetadata, Document, EmbeddedChunk};

use super::Store;

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_document(&self, doc: &Document, chunks: &[EmbeddedChunk]) -> Result<String> {
        let metadata_json =
            serde_json::to_string(&doc.metadata).context("Failed to serialize metadata")?;

        // Document row and all chunk rows commit together, so a failure
        // mid-write never leaves a document invisible to retrieval.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO documents (id, content, category, metadata_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.content)
        .bind(doc.category.as_str())
        .bind(&metadata_json)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(&mut *tx)
        .await?;

        for (index, chunk) in chunks.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO chunks (document_id, chunk_index, content, embedding)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&doc.id)
            .bind(index as i64)
            .bind(&chunk.content)
            .bind(vec_to_blob(&chunk.embedding))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(doc.id.clone())
    }

    async fn delete_document(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM chunks WHERE document_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_category(&self, category: Category) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM chunks WHERE document_id IN (SELECT id FROM documents WHERE category = ?)",
        )
        .bind(category.as_str())
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM documents WHERE category = ?")
            .bind(category.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn similarity_search(
        &self,
        query_vec: &[f32],
        category: Category,
        min_similarity: f64,
        limit: i64,
    ) -> Result<Vec<Candidate>> {
        let rows = sqlx::query(
            r#"
            SELECT c.content, c.embedding, d.metadata_json
            FROM chunks c
            JOIN documents d ON d.id = c.document_id
            WHERE d.category = ?
            "#,
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut candidates = Vec::new();
        for row in &rows {
            let blob: Vec<u8> = row.get("embedding");
            let similarity = cosine_similarity(query_vec, &blob_to_vec(&blob)) as f64;
            if similarity <= min_similarity {
                continue;
            }

            let metadata_json: String = row.get("metadata_json");
            let metadata: DocMetadata = serde_json::from_str(&metadata_json)
                .context("Stored metadata does not match its category schema")?;

            candidates.push(Candidate {
                content: row.get("content"),
                similarity,
                category,
                metadata,
                score: similarity,
            });
        }

        candidates.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(limit as usize);
        Ok(candidates)
    }

    async fn count_documents(&self, category: Category) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE category = ?")
            .bind(category.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn discussion_thread_ids(&self) -> Result<Vec<i64>> {
        let rows = sqlx::query("SELECT metadata_json FROM documents WHERE category = 'discussion'")
            .fetch_all(&self.pool)
            .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            let metadata_json: String = row.get("metadata_json");
            let metadata: DocMetadata = serde_json::from_str(&metadata_json)
                .context("Stored metadata does not match its category schema")?;
            if let DocMetadata::Discussion { thread_id, .. } = metadata {
                ids.push(thread_id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}
