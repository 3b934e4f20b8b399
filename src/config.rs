use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

/// Per-category retrieval parameters.
///
/// Instructions are terse and authoritative, so they get a tighter
/// relevance bar and a smaller result budget. Discussions are noisier and
/// more numerous, so a looser bar feeds the ranker a larger candidate pool
/// to re-sort by provenance.
#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_instruction_min_similarity")]
    pub instruction_min_similarity: f64,
    #[serde(default = "default_instruction_limit")]
    pub instruction_limit: i64,
    #[serde(default = "default_discussion_min_similarity")]
    pub discussion_min_similarity: f64,
    #[serde(default = "default_discussion_limit")]
    pub discussion_limit: i64,
    /// Cap on the ranked list handed to answer synthesis.
    #[serde(default = "default_final_limit")]
    pub final_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            instruction_min_similarity: default_instruction_min_similarity(),
            instruction_limit: default_instruction_limit(),
            discussion_min_similarity: default_discussion_min_similarity(),
            discussion_limit: default_discussion_limit(),
            final_limit: default_final_limit(),
        }
    }
}

fn default_instruction_min_similarity() -> f64 {
    0.6
}
fn default_instruction_limit() -> i64 {
    3
}
fn default_discussion_min_similarity() -> f64 {
    0.5
}
fn default_discussion_limit() -> i64 {
    6
}
fn default_final_limit() -> usize {
    8
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.retrieval.final_limit < 1 {
        anyhow::bail!("retrieval.final_limit must be >= 1");
    }
    if config.retrieval.instruction_limit < 1 || config.retrieval.discussion_limit < 1 {
        anyhow::bail!("retrieval category limits must be >= 1");
    }
    if config.embedding.is_enabled() && config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_tuning() {
        let cfg = RetrievalConfig::default();
        assert_eq!(cfg.instruction_min_similarity, 0.6);
        assert_eq!(cfg.instruction_limit, 3);
        assert_eq!(cfg.discussion_min_similarity, 0.5);
        assert_eq!(cfg.discussion_limit, 6);
        assert_eq!(cfg.final_limit, 8);
    }

    #[test]
    fn test_load_minimal_config() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[db]\npath = \"/tmp/studyhall.sqlite\"").unwrap();
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.embedding.provider, "disabled");
        assert!(!cfg.embedding.is_enabled());
        assert_eq!(cfg.retrieval.final_limit, 8);
    }

    #[test]
    fn test_load_rejects_zero_final_limit() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "[db]\npath = \"/tmp/studyhall.sqlite\"\n[retrieval]\nfinal_limit = 0"
        )
        .unwrap();
        assert!(load_config(f.path()).is_err());
    }
}
