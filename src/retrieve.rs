//! Scoring, ranking, and the retrieval facade.
//!
//! [`find_relevant_content`] is the single entry point the answer-synthesis
//! layer calls as a tool: it embeds the question, runs one similarity
//! search per category (concurrently — they have no data dependency), then
//! merges and re-ranks the combined pool.
//!
//! # Scoring
//!
//! Final score is raw cosine similarity plus additive provenance boosts:
//!
//! ```text
//! score = similarity
//!       + 0.10   if instruction
//!       + 0.08   if discussion and staff-answered
//!       + 0.03   if discussion and answer_count > 3
//! ```
//!
//! Official instructions and staff-verified answers outrank unverified
//! student discussion at equal semantic similarity; thread popularity is a
//! weak secondary signal. A staff-answered popular thread receives both
//! discussion boosts. The ranked list is truncated to a fixed budget so
//! the context handed to answer synthesis stays bounded.

use anyhow::{Context, Result};

use crate::config::RetrievalConfig;
use crate::embedding::Embedder;
use crate::models::{Candidate, Category};
use crate::store::Store;

/// Boost for official instruction content.
pub const INSTRUCTION_BOOST: f64 = 0.10;
/// Boost for discussion threads with an authoritative staff answer.
pub const STAFF_ANSWERED_BOOST: f64 = 0.08;
/// Boost for popular discussion threads.
pub const POPULAR_THREAD_BOOST: f64 = 0.03;
/// A thread is "popular" above this many answers.
pub const POPULAR_THREAD_MIN_ANSWERS: i64 = 3;

/// Similarity plus category/provenance boosts.
pub fn compute_score(candidate: &Candidate) -> f64 {
    let mut score = candidate.similarity;
    match candidate.category {
        Category::Instruction => score += INSTRUCTION_BOOST,
        Category::Discussion => {
            if candidate.metadata.is_staff_answered() {
                score += STAFF_ANSWERED_BOOST;
            }
            if candidate.metadata.answer_count() > POPULAR_THREAD_MIN_ANSWERS {
                score += POPULAR_THREAD_BOOST;
            }
        }
    }
    score
}

/// Score, sort, and truncate a candidate pool.
///
/// Sorts descending by boosted score, ties broken by raw similarity
/// (stable, so equal candidates keep their incoming order), and keeps the
/// top `limit`.
pub fn rank(mut candidates: Vec<Candidate>, limit: usize) -> Vec<Candidate> {
    for c in &mut candidates {
        c.score = compute_score(c);
    }
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.similarity
                    .partial_cmp(&a.similarity)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });
    candidates.truncate(limit);
    candidates
}

/// Retrieve the passages most relevant to `query`, ranked and capped.
///
/// Embeds the query, searches both categories with their own thresholds
/// and limits, concatenates, and ranks. Zero results is a valid outcome;
/// an error means the embedding call or a search failed — there is no
/// partial-result degradation and no internal retry. Safe to re-run with
/// the same query.
pub async fn find_relevant_content<S: Store + ?Sized>(
    store: &S,
    embedder: &dyn Embedder,
    params: &RetrievalConfig,
    query: &str,
) -> Result<Vec<Candidate>> {
    let query_vec = embedder
        .embed(query)
        .await
        .context("Failed to embed query")?;

    let (instruction, discussion) = tokio::join!(
        store.similarity_search(
            &query_vec,
            Category::Instruction,
            params.instruction_min_similarity,
            params.instruction_limit,
        ),
        store.similarity_search(
            &query_vec,
            Category::Discussion,
            params.discussion_min_similarity,
            params.discussion_limit,
        ),
    );

    let mut candidates = instruction.context("Instruction search failed")?;
    candidates.extend(discussion.context("Discussion search failed")?);

    Ok(rank(candidates, params.final_limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocMetadata;

    fn discussion(similarity: f64, staff: bool, answers: i64) -> Candidate {
        Candidate {
            content: "post".into(),
            similarity,
            category: Category::Discussion,
            metadata: DocMetadata::Discussion {
                thread_id: 1,
                title: "t".into(),
                created_at: "2024-01-01".into(),
                is_answered: true,
                is_staff_answered: staff,
                category: "hw".into(),
                subcategory: "hw1".into(),
                answer_count: answers,
                view_count: 0,
            },
            score: 0.0,
        }
    }

    fn instruction(similarity: f64) -> Candidate {
        Candidate {
            content: "Task 1: do the thing".into(),
            similarity,
            category: Category::Instruction,
            metadata: DocMetadata::Instruction {
                document_id: "proj1.pdf".into(),
                title: "Project 1".into(),
                created_at: "2024-01-01".into(),
                section: "tasks".into(),
                assignment_type: crate::models::AssignmentType::Project,
                page_number: None,
            },
            score: 0.0,
        }
    }

    #[test]
    fn test_boosts_are_additive() {
        // Staff-answered and popular: both boosts apply.
        let c = discussion(0.6, true, 5);
        assert!((compute_score(&c) - 0.71).abs() < 1e-9);

        // Neither flag: similarity alone.
        let c = discussion(0.6, false, 1);
        assert!((compute_score(&c) - 0.60).abs() < 1e-9);

        // Popularity threshold is strict: exactly 3 answers gets nothing.
        let c = discussion(0.6, false, 3);
        assert!((compute_score(&c) - 0.60).abs() < 1e-9);
    }

    #[test]
    fn test_instruction_boost() {
        let c = instruction(0.65);
        assert!((compute_score(&c) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_monotonic_within_flags() {
        // Same provenance flags: higher similarity never scores lower.
        let a = discussion(0.8, true, 5);
        let b = discussion(0.7, true, 5);
        assert!(compute_score(&a) >= compute_score(&b));
    }

    #[test]
    fn test_rank_reorders_by_provenance() {
        // Staff-answered at 0.65 (0.73) outranks plain discussion at 0.7.
        let ranked = rank(vec![discussion(0.7, false, 0), discussion(0.65, true, 0)], 8);
        assert!(ranked[0].metadata.is_staff_answered());
        assert!((ranked[0].score - 0.73).abs() < 1e-9);
    }

    #[test]
    fn test_rank_caps_results() {
        let pool: Vec<Candidate> = (0..12).map(|i| discussion(0.9 - i as f64 * 0.01, false, 0)).collect();
        let ranked = rank(pool, 8);
        assert_eq!(ranked.len(), 8);
        // Highest similarity survives the cut.
        assert!((ranked[0].similarity - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_rank_tie_broken_by_similarity() {
        // Equal boosted scores: 0.70 plain vs 0.62 staff-answered (0.70).
        let plain = discussion(0.70, false, 0);
        let staff = discussion(0.62, true, 0);
        let ranked = rank(vec![staff, plain], 8);
        assert!((ranked[0].similarity - 0.70).abs() < 1e-9);
        assert!(!ranked[0].metadata.is_staff_answered());
    }

    #[test]
    fn test_rank_empty_pool() {
        assert!(rank(Vec::new(), 8).is_empty());
    }
}
