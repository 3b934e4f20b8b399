//! # Studyhall
//!
//! Retrieval and ranking engine for course Q&A. Stores class-discussion
//! threads and course-instruction excerpts, embeds them into a vector
//! space, and at query time retrieves and re-ranks the passages most
//! relevant to a question — blending cosine similarity with document-type
//! and provenance signals (official instruction vs. staff-answered vs.
//! student discussion) — before handing them to an answer-synthesis layer.
//!
//! The web layer, chat UI, and the LLM call itself are external
//! collaborators; this crate is the chunking, storage, search, and ranking
//! core plus a small CLI.

pub mod chunk;
pub mod config;
pub mod db;
pub mod embedding;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod retrieve;
pub mod store;

pub use config::{Config, EmbeddingConfig, RetrievalConfig};
pub use embedding::{create_embedder, Embedder};
pub use ingest::{ingest_batch, wipe};
pub use models::{Candidate, Category, DocMetadata, Document, IngestItem, IngestReport};
pub use retrieve::find_relevant_content;
pub use store::Store;
