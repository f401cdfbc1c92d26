use crate::error::{AnalysisError, Result};
use marketlens_chunker::ChunkerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime parameters of the analysis pipeline. Every section is optional in TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub chunking: ChunkerConfig,
    pub retrieval: RetrievalConfig,
    pub context: ContextConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Chunks retrieved for free-text categories
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextConfig {
    /// Upper bound on assembled context, in characters
    pub max_context_size: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_size: 12_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Deterministic hash vectors; no network
    #[default]
    Stub,
    /// OpenAI-compatible embeddings endpoint
    OpenAi,
}

impl std::str::FromStr for EmbeddingMode {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stub" => Ok(Self::Stub),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("unknown embedding mode '{other}' (expected stub|openai)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::Stub,
            model: "text-embedding-3-small".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|err| AnalysisError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw).map_err(|err| match err {
            AnalysisError::InvalidConfig(msg) => {
                AnalysisError::InvalidConfig(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking.validate().map_err(AnalysisError::InvalidConfig)?;
        if self.retrieval.top_k == 0 {
            return Err(AnalysisError::InvalidConfig(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }
        if self.context.max_context_size == 0 {
            return Err(AnalysisError::InvalidConfig(
                "context.max_context_size must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(AnalysisError::InvalidConfig(format!(
                "generation.temperature {} is outside 0.0..=2.0",
                self.generation.temperature
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.context.max_context_size, 12_000);
        assert_eq!(config.embedding.mode, EmbeddingMode::Stub);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            [chunking]
            chunk_size = 500
            chunk_overlap = 50

            [embedding]
            mode = "openai"
            "#,
        )
        .unwrap();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.embedding.mode, EmbeddingMode::OpenAi);
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.retrieval.top_k, 4);
    }

    #[test]
    fn rejects_invalid_values() {
        let overlap = "[chunking]\nchunk_size = 100\nchunk_overlap = 100";
        assert!(AnalysisConfig::from_toml_str(overlap).is_err());
        assert!(AnalysisConfig::from_toml_str("[retrieval]\ntop_k = 0").is_err());
        assert!(AnalysisConfig::from_toml_str("[context]\nmax_context_size = 0").is_err());
        assert!(AnalysisConfig::from_toml_str("[retrieval]\nk = 3").is_err());
    }

    #[test]
    fn narrow_strides_are_accepted_with_the_default_lookback() {
        let config =
            AnalysisConfig::from_toml_str("[chunking]\nchunk_size = 100\nchunk_overlap = 50\n")
                .unwrap();
        assert_eq!(config.chunking.stride(), 50);
        assert!(AnalysisConfig::from_toml_str("[chunking]\nchunk_size = 150\nchunk_overlap = 100")
            .is_ok());
        assert!(AnalysisConfig::from_toml_str("[chunking]\nchunk_size = 120").is_ok());
    }

    #[test]
    fn embedding_mode_parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<EmbeddingMode>(), Ok(EmbeddingMode::OpenAi));
        assert!("gpu".parse::<EmbeddingMode>().is_err());
    }
}
