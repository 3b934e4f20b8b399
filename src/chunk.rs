//! Category-aware text chunker.
//!
//! Splits a raw document into retrieval-sized units. The strategy depends
//! on the document [`Category`]:
//!
//! - **Instruction** documents are normalized (URLs, page-footer timestamps,
//!   whitespace runs stripped) and parsed into named sections delimited by
//!   the literal markers `Introduction`, `Tasks`, and `Deliverables`. Each
//!   chunk is prefixed with a human-readable label (`"Introduction: "`,
//!   `"Task 3: "`, `"Deliverable 2: "`) so lexical cues reinforce the
//!   semantic embedding. Marker detection is best-effort structural
//!   parsing: an absent marker simply contributes no chunks.
//! - **Discussion** content is split into sentences (sentence-ending
//!   punctuation followed by whitespace and a capital letter) which are
//!   greedily accumulated up to a 500-character soft cap. Splits never
//!   happen mid-sentence, so a single oversized sentence becomes its own
//!   chunk.
//!
//! Chunking is deterministic and pure: no I/O, no randomness. Empty or
//! whitespace-only input yields an empty chunk list for both categories,
//! and callers must tolerate an instruction document whose markers never
//! match (zero chunks).

use regex::Regex;
use std::sync::OnceLock;

use crate::models::Category;

/// Soft cap on discussion chunk length, in characters.
///
/// Sentences accumulate into a chunk until appending the next one would
/// cross this budget. Never causes mid-sentence truncation.
pub const DISCUSSION_CHUNK_BUDGET: usize = 500;

/// Split `content` into embeddable chunks for its category.
pub fn chunk(content: &str, category: Category) -> Vec<String> {
    match category {
        Category::Instruction => chunk_instruction(content),
        Category::Discussion => chunk_discussion(content),
    }
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("valid regex"))
}

fn footer_re() -> &'static Regex {
    // PDF page footers like "10/12/24, 3:41 PM Project 2 - CS6200".
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d{1,2}/\d{1,2}/\d{2,4},\s+\d{1,2}:\d{2}\s+[AP]M[^\n]*").expect("valid regex")
    })
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn task_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.\s+").expect("valid regex"))
}

fn deliverable_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Task (\d+):").expect("valid regex"))
}

/// Strip URLs and footer artifacts, collapse whitespace runs to single
/// spaces, and trim. Footer stripping runs before whitespace collapsing
/// because the footer pattern extends to end-of-line.
fn normalize_instruction_text(input: &str) -> String {
    let no_urls = url_re().replace_all(input, "");
    let no_footers = footer_re().replace_all(&no_urls, "");
    whitespace_re()
        .replace_all(&no_footers, " ")
        .trim()
        .to_string()
}

fn chunk_instruction(content: &str) -> Vec<String> {
    let text = normalize_instruction_text(content);
    let mut chunks = Vec::new();

    // Introduction: span between the "Introduction" marker and "Tasks".
    if let Some(intro_start) = text.find("Introduction") {
        let after = intro_start + "Introduction".len();
        if let Some(tasks_rel) = text[after..].find("Tasks") {
            let body = text[after..after + tasks_rel].trim();
            if !body.is_empty() {
                chunks.push(format!("Introduction: {}", body));
            }
        }
    }

    // Task N: spans led by "N. " inside the Tasks..Deliverables region.
    if let Some(tasks_start) = text.find("Tasks") {
        if let Some(deliv_rel) = text[tasks_start..].find("Deliverables") {
            let region = &text[tasks_start..tasks_start + deliv_rel];
            let markers: Vec<_> = task_marker_re().find_iter(region).collect();
            for (i, m) in markers.iter().enumerate() {
                let end = markers.get(i + 1).map(|n| n.start()).unwrap_or(region.len());
                let body = region[m.end()..end].trim();
                let number: &str = region[m.start()..m.end()].trim_end_matches(|c: char| {
                    c == '.' || c.is_whitespace()
                });
                if !body.is_empty() {
                    chunks.push(format!("Task {}: {}", number, body));
                }
            }
        }
    }

    // Deliverable N: spans led by "Task N:" after the "Deliverables"
    // marker. The span keeps its "Task N:" marker so the chunk text still
    // names the task it deliverables for.
    if let Some(deliv_start) = text.find("Deliverables") {
        let region = &text[deliv_start + "Deliverables".len()..];
        let markers: Vec<_> = deliverable_marker_re()
            .captures_iter(region)
            .filter_map(|c| {
                let m = c.get(0)?;
                let n = c.get(1)?.as_str().to_string();
                Some((m.start(), n))
            })
            .collect();
        for (i, (start, number)) in markers.iter().enumerate() {
            let end = markers.get(i + 1).map(|(s, _)| *s).unwrap_or(region.len());
            let body = region[*start..end].trim();
            if !body.is_empty() {
                chunks.push(format!("Deliverable {}: {}", number, body));
            }
        }
    }

    chunks
}

/// Split text into sentences. A boundary is sentence-ending punctuation
/// followed by at least one whitespace character and an ASCII capital
/// letter; the whitespace separator is consumed.
fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < chars.len() {
        let (pos, c) = chars[i];
        if matches!(c, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && chars[j].1.is_whitespace() {
                j += 1;
            }
            if j > i + 1 && j < chars.len() && chars[j].1.is_ascii_uppercase() {
                sentences.push(&text[start..pos + c.len_utf8()]);
                start = chars[j].0;
                i = j;
                continue;
            }
        }
        i += 1;
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

fn chunk_discussion(content: &str) -> Vec<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut chunks: Vec<String> = Vec::new();
    for sentence in split_sentences(trimmed) {
        match chunks.last_mut() {
            Some(current) if current.len() + sentence.len() <= DISCUSSION_CHUNK_BUDGET => {
                current.push(' ');
                current.push_str(sentence);
            }
            _ => chunks.push(sentence.to_string()),
        }
    }
    chunks
}
