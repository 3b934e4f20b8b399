//! Storage abstraction for documents and their embedded chunks.
//!
//! The [`Store`] trait covers everything the ingestion and retrieval
//! pipeline needs from a backend: atomic document+chunk insertion,
//! category-scoped similarity search, and cascading deletes. The
//! production backend is SQLite ([`sqlite::SqliteStore`]);
//! [`memory::MemoryStore`] serves tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Candidate, Category, Document, EmbeddedChunk};

/// Abstract storage backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_document`](Store::insert_document) | Insert a document with all its chunks, atomically |
/// | [`delete_document`](Store::delete_document) | Delete one document and its chunks |
/// | [`delete_by_category`](Store::delete_by_category) | Wipe a whole category, cascading to chunks |
/// | [`similarity_search`](Store::similarity_search) | Category-scoped cosine similarity search |
/// | [`count_documents`](Store::count_documents) | Documents per category |
/// | [`discussion_thread_ids`](Store::discussion_thread_ids) | Thread ids already ingested |
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a document together with all of its embedded chunks.
    ///
    /// All-or-nothing: either the document row and every chunk row land,
    /// or nothing is written. Returns the document id.
    async fn insert_document(&self, doc: &Document, chunks: &[EmbeddedChunk]) -> Result<String>;

    /// Delete a document and, transitively, all its chunks.
    ///
    /// Returns `true` if a document was deleted.
    async fn delete_document(&self, id: &str) -> Result<bool>;

    /// Delete every document of `category` and all their chunks, leaving
    /// the other category untouched. Returns the number of documents
    /// removed.
    async fn delete_by_category(&self, category: Category) -> Result<u64>;

    /// Find chunks of `category` whose embedding has cosine similarity
    /// strictly greater than `min_similarity` against `query_vec`.
    ///
    /// Results are ordered by descending similarity and truncated to
    /// `limit`. Each candidate's `score` is initialized to its raw
    /// similarity; provenance boosts are the ranker's job.
    async fn similarity_search(
        &self,
        query_vec: &[f32],
        category: Category,
        min_similarity: f64,
        limit: i64,
    ) -> Result<Vec<Candidate>>;

    /// Count stored documents of one category.
    async fn count_documents(&self, category: Category) -> Result<i64>;

    /// Thread ids of every ingested discussion document, so callers can
    /// skip threads they have already ingested.
    async fn discussion_thread_ids(&self) -> Result<Vec<i64>>;
}
