//! Batch ingestion orchestration.
//!
//! Coordinates the flow per item: validate metadata against the batch
//! category → chunk → embed → insert document and chunks in one
//! transaction. Failures are isolated per item so one bad thread never
//! sinks the rest of the batch; callers get an [`IngestReport`] with one
//! outcome per submitted item.
//!
//! Because chunk embedding happens before anything touches the store, an
//! embedding failure writes nothing at all — there is no orphaned-document
//! state to repair.

use anyhow::{bail, Result};

use crate::chunk::chunk;
use crate::embedding::Embedder;
use crate::models::{Category, Document, EmbeddedChunk, IngestItem, IngestOutcome, IngestReport};
use crate::store::Store;

/// Ingest a batch of items into one category.
///
/// Each item is processed independently; the report carries a per-item
/// outcome in submission order. `batch_size` bounds how many chunk texts
/// go to the embedder in a single call.
pub async fn ingest_batch<S: Store + ?Sized>(
    store: &S,
    embedder: &dyn Embedder,
    batch_size: usize,
    category: Category,
    items: Vec<IngestItem>,
) -> IngestReport {
    let mut outcomes = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let title = item.metadata.title().to_string();
        match ingest_one(store, embedder, batch_size, category, item).await {
            Ok((document_id, chunk_count)) => outcomes.push(IngestOutcome {
                index,
                title,
                document_id: Some(document_id),
                chunk_count,
                error: None,
            }),
            Err(e) => outcomes.push(IngestOutcome {
                index,
                title,
                document_id: None,
                chunk_count: 0,
                error: Some(format!("{:#}", e)),
            }),
        }
    }

    IngestReport { outcomes }
}

async fn ingest_one<S: Store + ?Sized>(
    store: &S,
    embedder: &dyn Embedder,
    batch_size: usize,
    category: Category,
    item: IngestItem,
) -> Result<(String, usize)> {
    if item.metadata.category() != category {
        bail!(
            "Metadata is '{}' but the batch category is '{}'",
            item.metadata.category(),
            category
        );
    }

    let chunks = chunk(&item.content, category);
    if chunks.is_empty() {
        bail!("Content produced no chunks (empty input or no recognizable sections)");
    }

    let mut embedded = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(batch_size.max(1)) {
        let vectors = embedder.embed_batch(batch).await?;
        for (content, embedding) in batch.iter().zip(vectors) {
            embedded.push(EmbeddedChunk {
                content: content.clone(),
                embedding,
            });
        }
    }

    let doc = Document::new(item.content, item.metadata);
    let chunk_count = embedded.len();
    let id = store.insert_document(&doc, &embedded).await?;
    Ok((id, chunk_count))
}

/// Remove every document (and cascading chunks) of one category.
///
/// Used before bulk re-ingestion to keep the store consistent with the
/// external source of truth. Returns the number of documents removed.
pub async fn wipe<S: Store + ?Sized>(store: &S, category: Category) -> Result<u64> {
    store.delete_by_category(category).await
}
