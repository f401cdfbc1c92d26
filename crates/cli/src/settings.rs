use anyhow::{Context as AnyhowContext, Result};
use marketlens_analysis::{AnalysisConfig, EmbeddingMode};
use std::path::{Path, PathBuf};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Everything a command needs to run: the pipeline config plus process-level settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub analysis: AnalysisConfig,
    pub index_dir: PathBuf,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
}

impl Settings {
    /// Config file (or defaults), then environment overrides, then validation.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let analysis = match config_path {
            Some(path) => AnalysisConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => AnalysisConfig::default(),
        };
        let mut settings = Self {
            analysis,
            index_dir: default_index_dir(),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.analysis.validate()?;
        Ok(settings)
    }

    /// Apply `MARKETLENS_*` and `OPENAI_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(raw) = get("MARKETLENS_CHUNK_SIZE") {
            self.analysis.chunking.chunk_size = parse_usize("MARKETLENS_CHUNK_SIZE", &raw)?;
        }
        if let Some(raw) = get("MARKETLENS_CHUNK_OVERLAP") {
            self.analysis.chunking.chunk_overlap = parse_usize("MARKETLENS_CHUNK_OVERLAP", &raw)?;
        }
        if let Some(raw) = get("MARKETLENS_TOP_K") {
            self.analysis.retrieval.top_k = parse_usize("MARKETLENS_TOP_K", &raw)?;
        }
        if let Some(raw) = get("MARKETLENS_MAX_CONTEXT") {
            self.analysis.context.max_context_size = parse_usize("MARKETLENS_MAX_CONTEXT", &raw)?;
        }
        if let Some(raw) = get("MARKETLENS_EMBEDDING_MODE") {
            self.analysis.embedding.mode = raw
                .parse::<EmbeddingMode>()
                .map_err(|err| anyhow::anyhow!("MARKETLENS_EMBEDDING_MODE: {err}"))?;
        }
        if let Some(dir) = get("MARKETLENS_INDEX_DIR") {
            self.index_dir = PathBuf::from(dir);
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.openai_api_key = Some(key.trim().to_string());
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.openai_base_url = url.trim().trim_end_matches('/').to_string();
        }
        Ok(())
    }
}

fn parse_usize(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'"))
}

fn default_index_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("marketlens")
        .join("indexes")
}
