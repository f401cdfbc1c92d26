use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid rule table: {0}")]
    InvalidRules(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Extractor error: {0}")]
    Extract(#[from] marketlens_extractor::ExtractError),

    #[error("Chunker error: {0}")]
    Chunker(#[from] marketlens_chunker::ChunkerError),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] marketlens_vector_store::VectorStoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
