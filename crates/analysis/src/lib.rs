//! # Marketlens Analysis
//!
//! Decides what data answers a question and builds the bounded context handed to the
//! generation service.
//!
//! ## Architecture
//!
//! ```text
//! sources ──> DocumentFetcher ──> Extractor + RecordBuilder ──> Record[]
//!                                                                  │
//! query ──> QueryClassifier (first-match rule table) ──> Category  │
//!                                                          │       │
//!                                   ┌──────────────────────┴───────┘
//!                                   ▼
//!                 Router (category filter, sort_key desc)
//!                   │ records found           │ none, free-text category
//!                   ▼                         ▼
//!           assemble_records        Chunker ─> IndexStore ─> top-k chunks
//!                   │                         │
//!                   └──────> ContextAssembler (max_chars) <─┘
//!                                   │
//!                   available? ──> TemplateLibrary + GenerationService
//! ```
//!
//! Categories answered only from records (`top_gainers`, `large_cap`, `shareholding`,
//! `profit_loss`) never fall back to retrieval; without records they produce an explicit
//! "not available" context and generation is skipped.

mod assembler;
mod config;
mod error;
mod pipeline;
mod query_classifier;
mod router;
mod service;
mod templates;

pub use assembler::ContextAssembler;
pub use config::{
    AnalysisConfig, ContextConfig, EmbeddingConfig, EmbeddingMode, GenerationConfig,
    RetrievalConfig,
};
pub use error::{AnalysisError, Result};
pub use pipeline::{
    document_text, AnalysisOutcome, AnalysisReport, Analyzer, Collaborators, ExtractedDocument,
    FailureStage, PageKind, SourceFailure,
};
pub use query_classifier::{QueryClassifier, Rule, RuleTable};
pub use router::Router;
pub use service::{DocumentFetcher, FetchError, GenerationError, GenerationService};
pub use templates::{TemplateLibrary, QUERY_PLACEHOLDER};
