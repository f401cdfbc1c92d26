//! Seams to the outside world. The pipeline only sees these traits; HTTP, browser and model
//! specifics live in their implementations.

use async_trait::async_trait;
use marketlens_extractor::RawDocument;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{source_id} returned HTTP {status}")]
    Status { source_id: String, status: u16 },

    #[error("request to {source_id} failed: {message}")]
    Transport { source_id: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation service is not configured: {0}")]
    NotConfigured(String),

    #[error("generation request failed: {0}")]
    Request(String),

    #[error("generation service returned no text")]
    EmptyResponse,
}

/// Retrieves the raw HTML of a source (URL, file path, ...).
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<RawDocument, FetchError>;
}

/// Turns an analysis prompt and an assembled context into free text.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_content: &str)
        -> Result<String, GenerationError>;
}
