//! In-memory [`Store`] implementation for tests.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.
//! Similarity search is brute-force cosine over all stored vectors, the
//! same algorithm the SQLite store runs over its BLOB column.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{Candidate, Category, Document, EmbeddedChunk};

use super::Store;

struct StoredChunk {
    document_id: String,
    content: String,
    embedding: Vec<f32>,
}

/// In-memory store. Not persistent; intended for unit and integration
/// tests of the pipeline around it.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, Document>>,
    chunks: RwLock<Vec<StoredChunk>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks currently held, across all documents.
    pub fn chunk_count(&self) -> usize {
        self.chunks.read().unwrap().len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_document(&self, doc: &Document, chunks: &[EmbeddedChunk]) -> Result<String> {
        let mut docs = self.docs.write().unwrap();
        let mut stored = self.chunks.write().unwrap();
        docs.insert(doc.id.clone(), doc.clone());
        for c in chunks {
            stored.push(StoredChunk {
                document_id: doc.id.clone(),
                content: c.content.clone(),
                embedding: c.embedding.clone(),
            });
        }
        Ok(doc.id.clone())
    }

    async fn delete_document(&self, id: &str) -> Result<bool> {
        let mut docs = self.docs.write().unwrap();
        let removed = docs.remove(id).is_some();
        if removed {
            self.chunks.write().unwrap().retain(|c| c.document_id != id);
        }
        Ok(removed)
    }

    async fn delete_by_category(&self, category: Category) -> Result<u64> {
        let mut docs = self.docs.write().unwrap();
        let doomed: Vec<String> = docs
            .values()
            .filter(|d| d.category == category)
            .map(|d| d.id.clone())
            .collect();
        for id in &doomed {
            docs.remove(id);
        }
        self.chunks
            .write()
            .unwrap()
            .retain(|c| !doomed.contains(&c.document_id));
        Ok(doomed.len() as u64)
    }

    async fn similarity_search(
        &self,
        query_vec: &[f32],
        category: Category,
        min_similarity: f64,
        limit: i64,
    ) -> Result<Vec<Candidate>> {
        let docs = self.docs.read().unwrap();
        let chunks = self.chunks.read().unwrap();

        let mut candidates: Vec<Candidate> = chunks
            .iter()
            .filter_map(|c| {
                let doc = docs.get(&c.document_id)?;
                if doc.category != category {
                    return None;
                }
                let similarity = cosine_similarity(query_vec, &c.embedding) as f64;
                if similarity <= min_similarity {
                    return None;
                }
                Some(Candidate {
                    content: c.content.clone(),
                    similarity,
                    category: doc.category,
                    metadata: doc.metadata.clone(),
                    score: similarity,
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(limit as usize);
        Ok(candidates)
    }

    async fn count_documents(&self, category: Category) -> Result<i64> {
        let docs = self.docs.read().unwrap();
        Ok(docs.values().filter(|d| d.category == category).count() as i64)
    }

    async fn discussion_thread_ids(&self) -> Result<Vec<i64>> {
        let docs = self.docs.read().unwrap();
        let mut ids: Vec<i64> = docs
            .values()
            .filter_map(|d| match &d.metadata {
                crate::models::DocMetadata::Discussion { thread_id, .. } => Some(*thread_id),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
