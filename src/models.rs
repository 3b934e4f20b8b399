//! Core data models for the retrieval pipeline.
//!
//! Documents come in exactly two categories — official course instructions
//! and forum discussion threads — and each category fixes both the metadata
//! schema and the chunking strategy. Metadata is a tagged union validated
//! once at the ingestion boundary; downstream code pattern-matches on it
//! instead of probing optional fields.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Top-level document kind. Fixed at creation, never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Instruction,
    Discussion,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Instruction => "instruction",
            Category::Discussion => "discussion",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "instruction" => Ok(Category::Instruction),
            "discussion" => Ok(Category::Discussion),
            other => bail!("Unknown category: '{}'. Use instruction or discussion.", other),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assignment kind carried by instruction metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentType {
    Homework,
    Project,
    Syllabus,
    Other,
}

/// Category-specific document metadata.
///
/// The `type` tag is the discriminant and must always equal the owning
/// document's [`Category`]; [`Document::new`] derives the category from the
/// metadata so the two cannot diverge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocMetadata {
    Instruction {
        document_id: String,
        title: String,
        created_at: String,
        section: String,
        assignment_type: AssignmentType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page_number: Option<i64>,
    },
    Discussion {
        thread_id: i64,
        title: String,
        created_at: String,
        is_answered: bool,
        is_staff_answered: bool,
        category: String,
        subcategory: String,
        answer_count: i64,
        view_count: i64,
    },
}

impl DocMetadata {
    /// The category this metadata shape belongs to.
    pub fn category(&self) -> Category {
        match self {
            DocMetadata::Instruction { .. } => Category::Instruction,
            DocMetadata::Discussion { .. } => Category::Discussion,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            DocMetadata::Instruction { title, .. } => title,
            DocMetadata::Discussion { title, .. } => title,
        }
    }

    /// Whether a staff member posted an authoritative answer.
    /// Always `false` for instruction metadata.
    pub fn is_staff_answered(&self) -> bool {
        match self {
            DocMetadata::Discussion {
                is_staff_answered, ..
            } => *is_staff_answered,
            DocMetadata::Instruction { .. } => false,
        }
    }

    /// Number of answers on a discussion thread; `0` for instructions.
    pub fn answer_count(&self) -> i64 {
        match self {
            DocMetadata::Discussion { answer_count, .. } => *answer_count,
            DocMetadata::Instruction { .. } => 0,
        }
    }
}

/// A stored document: the unit of ingestion.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub category: Category,
    pub metadata: DocMetadata,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Document {
    /// Build a new document with a fresh UUID and current timestamps.
    ///
    /// The category is derived from the metadata discriminant, so a
    /// document can never carry metadata of the wrong shape.
    pub fn new(content: String, metadata: DocMetadata) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            category: metadata.category(),
            content,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A chunk paired with its embedding, ready for storage.
///
/// Chunks have no identity beyond their document and position; they are
/// never updated in place, only deleted and regenerated with the document.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A scored retrieval result. Transient: produced per query, never stored.
///
/// Carries the citation-relevant metadata fields so the answer-synthesis
/// layer can build references without another store round-trip.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub content: String,
    /// Raw cosine similarity against the query, in practice `[0, 1]`.
    pub similarity: f64,
    pub category: Category,
    pub metadata: DocMetadata,
    /// Similarity plus provenance boosts, filled in by the ranker.
    pub score: f64,
}

/// One item submitted to batch ingestion.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestItem {
    pub content: String,
    pub metadata: DocMetadata,
}

/// Per-item result of a batch ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    /// Position of the item in the submitted batch.
    pub index: usize,
    pub title: String,
    /// Assigned document id on success.
    pub document_id: Option<String>,
    pub chunk_count: usize,
    pub error: Option<String>,
}

impl IngestOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a batch ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub outcomes: Vec<IngestOutcome>,
}

impl IngestReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn chunks_written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.is_ok())
            .map(|o| o.chunk_count)
            .sum()
    }
}
